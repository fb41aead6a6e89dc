use std::cmp::Ordering;

/// Rows further apart than this many font heights start a new table.
pub const TABLE_GAP_FACTOR: f64 = 3.0;

/// Average glyph width as a fraction of the font size, used to estimate how
/// far a run of text extends to the right.
pub const GLYPH_WIDTH_FACTOR: f64 = 0.5;

/// A run of text placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub font_size: f64,
}

impl TextSpan {
    /// Builds a span whose width is estimated from the character count.
    pub fn new(text: impl Into<String>, x: f64, y: f64, font_size: f64) -> Self {
        let text = text.into();
        let width = estimate_width(&text, font_size);
        Self { text, x, y, width, font_size }
    }

    fn right(&self) -> f64 {
        self.x + self.width
    }

    fn center(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

pub fn estimate_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * GLYPH_WIDTH_FACTOR
}

/// A grid of text cells taken from one region of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    /// 1-based page the table was found on, when known.
    pub page: Option<usize>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows, page: None }
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits the spans of one page into tables.
    ///
    /// Spans are grouped into rows by baseline, rows are cut into separate
    /// tables wherever a vertical gap opens up, and each table gets its own
    /// column bands.
    pub fn from_spans(spans: Vec<TextSpan>) -> Vec<Table> {
        let spans: Vec<_> = spans
            .into_iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect();

        if spans.is_empty() {
            return Vec::new();
        }

        let avg_font_size = spans.iter().map(|s| s.font_size).sum::<f64>() / spans.len() as f64;
        let rows = cluster_into_rows(spans, avg_font_size * 0.5);

        split_at_gaps(rows, avg_font_size * TABLE_GAP_FACTOR)
            .into_iter()
            .map(|block| {
                let bands = detect_columns(&block);
                Table::new(assign_to_columns(block, &bands))
            })
            .collect()
    }
}

/// Group spans into rows by Y coordinate, top of the page first.
fn cluster_into_rows(mut spans: Vec<TextSpan>, tolerance: f64) -> Vec<Vec<TextSpan>> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut rows: Vec<Vec<TextSpan>> = Vec::new();
    let mut current_y: Option<f64> = None;

    for span in spans {
        if current_y.is_some_and(|y| (span.y - y).abs() <= tolerance) {
            if let Some(row) = rows.last_mut() {
                row.push(span);
                continue;
            }
        }
        current_y = Some(span.y);
        rows.push(vec![span]);
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }

    rows
}

fn split_at_gaps(rows: Vec<Vec<TextSpan>>, max_gap: f64) -> Vec<Vec<Vec<TextSpan>>> {
    let mut blocks: Vec<Vec<Vec<TextSpan>>> = Vec::new();
    let mut last_y: Option<f64> = None;

    for row in rows {
        let y = row[0].y;
        let same_block = last_y.is_some_and(|prev| prev - y <= max_gap);
        last_y = Some(y);
        if same_block {
            if let Some(block) = blocks.last_mut() {
                block.push(row);
                continue;
            }
        }
        blocks.push(vec![row]);
    }

    blocks
}

/// Column bands inferred from the most common number of spans per row.
///
/// Rows of that width are taken as the table body; each band spans from the
/// leftmost start to the rightmost end of the spans at that position.
fn detect_columns(rows: &[Vec<TextSpan>]) -> Vec<(f64, f64)> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for row in rows.iter().filter(|r| r.len() > 1) {
        match counts.iter_mut().find(|(len, _)| *len == row.len()) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.len(), 1)),
        }
    }

    let Some(&(width, _)) = counts.iter().max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0))) else {
        let left = rows.iter().flatten().map(|s| s.x).fold(f64::INFINITY, f64::min);
        let right = rows.iter().flatten().map(TextSpan::right).fold(f64::NEG_INFINITY, f64::max);
        return vec![(left, right)];
    };

    let mut bands = vec![(f64::INFINITY, f64::NEG_INFINITY); width];
    for row in rows.iter().filter(|r| r.len() == width) {
        for (band, span) in bands.iter_mut().zip(row) {
            band.0 = band.0.min(span.x);
            band.1 = band.1.max(span.right());
        }
    }

    bands.sort_by(|a, b| (a.0 + a.1).partial_cmp(&(b.0 + b.1)).unwrap_or(Ordering::Equal));
    bands
}

/// Index of the band a span overlaps most, or the nearest one when it
/// overlaps none.
fn band_for(span: &TextSpan, bands: &[(f64, f64)]) -> usize {
    let overlap = |&(lo, hi): &(f64, f64)| (span.right().min(hi) - span.x.max(lo)).max(0.0);
    let distance = |&(lo, hi): &(f64, f64)| (span.center() - (lo + hi) / 2.0).abs();

    let best = bands
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| overlap(a).partial_cmp(&overlap(b)).unwrap_or(Ordering::Equal));

    match best {
        Some((i, band)) if overlap(band) > 0.0 => i,
        _ => bands
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| distance(a).partial_cmp(&distance(b)).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0),
    }
}

fn assign_to_columns(rows: Vec<Vec<TextSpan>>, bands: &[(f64, f64)]) -> Vec<Vec<String>> {
    rows.into_iter()
        .map(|row| {
            let mut cells = vec![String::new(); bands.len().max(1)];
            for span in row {
                let cell = &mut cells[band_for(&span, bands)];
                if !cell.is_empty() {
                    cell.push(' ');
                }
                cell.push_str(span.text.trim());
            }
            cells
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f64, y: f64) -> TextSpan {
        TextSpan::new(text, x, y, 10.0)
    }

    #[test]
    fn test_simple_table() {
        let spans = vec![
            span("A", 0.0, 100.0),
            span("B", 50.0, 100.0),
            span("1", 0.0, 88.0),
            span("2", 50.0, 88.0),
        ];

        let tables = Table::from_spans(spans);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows, vec![vec!["A", "B"], vec!["1", "2"]]);
    }

    #[test]
    fn test_row_clustering() {
        let spans = vec![
            span("A", 0.0, 100.0),
            span("B", 50.0, 100.5),
            span("C", 0.0, 88.0),
        ];

        let rows = cluster_into_rows(spans, 5.0);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn test_gap_splits_tables() {
        let spans = vec![
            span("Summary", 0.0, 700.0),
            span("Balance", 0.0, 688.0),
            span("$10.00", 80.0, 688.0),
            span("Transactions", 0.0, 500.0),
            span("Date", 0.0, 488.0),
            span("Amount", 80.0, 488.0),
        ];

        let tables = Table::from_spans(spans);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows[0][0], "Summary");
        assert_eq!(tables[1].rows[0][0], "Transactions");
    }

    #[test]
    fn test_statement_layout_keeps_empty_header_cell() {
        // "Daily Cash" heads both the percent and the cash column.
        let spans = vec![
            span("Transactions", 40.0, 600.0),
            span("Date", 40.0, 585.0),
            span("Description", 110.0, 585.0),
            span("Daily Cash", 300.0, 585.0),
            span("Amount", 460.0, 585.0),
            span("09/01/2019", 40.0, 570.0),
            span("Store A", 110.0, 570.0),
            span("2%", 300.0, 570.0),
            span("$0.10", 380.0, 570.0),
            span("$5.00", 460.0, 570.0),
            span("09/02/2019", 40.0, 555.0),
            span("Store B", 110.0, 555.0),
            span("3%", 300.0, 555.0),
            span("$0.30", 380.0, 555.0),
            span("$10.00", 460.0, 555.0),
        ];

        let tables = Table::from_spans(spans);

        assert_eq!(tables.len(), 1);
        let rows = &tables[0].rows;
        assert_eq!(rows[0], vec!["Transactions", "", "", "", ""]);
        assert_eq!(rows[1], vec!["Date", "Description", "Daily Cash", "", "Amount"]);
        assert_eq!(rows[2], vec!["09/01/2019", "Store A", "2%", "$0.10", "$5.00"]);
    }

    #[test]
    fn test_single_column_text() {
        let spans = vec![span("only", 10.0, 100.0), span("lines", 10.0, 88.0)];
        let tables = Table::from_spans(spans);

        assert_eq!(tables[0].rows, vec![vec!["only"], vec!["lines"]]);
    }

    #[test]
    fn test_blank_spans_ignored() {
        assert!(Table::from_spans(vec![span("  ", 0.0, 0.0)]).is_empty());
    }
}
