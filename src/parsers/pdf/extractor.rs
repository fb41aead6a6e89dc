use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use lopdf::{
    Document, Object,
    content::{Content, Operation},
};
use once_cell::sync::Lazy;

use super::{
    font::FontDecoder,
    table::{GLYPH_WIDTH_FACTOR, Table, TextSpan},
};
use crate::{
    errors::StatementResult,
    parsers::traits::{PageRange, TableSource},
};

/// A statement PDF opened for table extraction.
pub struct PdfDocument {
    document: Document,
    path: PathBuf,
}

impl PdfDocument {
    pub fn open(path: impl AsRef<Path>) -> StatementResult<Self> {
        let path = path.as_ref();
        let document = Document::load(path)?;
        Ok(Self {
            document,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Positioned text of one page (1-based). Missing pages have no text.
    pub fn page_spans(&self, page: usize) -> StatementResult<Vec<TextSpan>> {
        let Ok(number) = u32::try_from(page) else {
            return Ok(Vec::new());
        };
        let Some(&page_id) = self.document.get_pages().get(&number) else {
            return Ok(Vec::new());
        };

        let fonts: BTreeMap<Vec<u8>, FontDecoder> = self
            .document
            .get_page_fonts(page_id)
            .into_iter()
            .map(|(name, font)| (name, FontDecoder::from_font(&self.document, font)))
            .collect();

        let data = self.document.get_page_content(page_id)?;
        let content = Content::decode(&data)?;
        Ok(TextCursor::new(&fonts).run(&content.operations))
    }
}

impl TableSource for PdfDocument {
    fn tables(&self, pages: PageRange) -> StatementResult<Vec<Table>> {
        pages.validate()?;

        let page_count = self.page_count();
        if pages.first > page_count {
            tracing::warn!(
                "{} has {} page(s), nothing to read from page {}",
                self.path.display(),
                page_count,
                pages.first
            );
        }

        let mut tables = Vec::new();
        for page in pages.pages(page_count) {
            let spans = self.page_spans(page)?;
            tracing::debug!("page {}: {} text spans", page, spans.len());
            tables.extend(Table::from_spans(spans).into_iter().map(|t| t.on_page(page)));
        }
        Ok(tables)
    }
}

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// TJ adjustments wider than this (thousandths of an em) read as a space.
const WORD_GAP: f64 = 200.0;

/// `lhs` applied first, then `rhs`.
fn multiply(lhs: &Matrix, rhs: &Matrix) -> Matrix {
    let [a1, b1, c1, d1, e1, f1] = *lhs;
    let [a2, b2, c2, d2, e2, f2] = *rhs;
    [
        a1 * a2 + b1 * c2,
        a1 * b2 + b1 * d2,
        c1 * a2 + d1 * c2,
        c1 * b2 + d1 * d2,
        e1 * a2 + f1 * c2 + e2,
        e1 * b2 + f1 * d2 + f2,
    ]
}

/// The parts of the graphics state that `q`/`Q` save and restore.
#[derive(Debug, Clone, Copy)]
struct GraphicsState<'a> {
    ctm: Matrix,
    font: Option<&'a FontDecoder>,
    font_size: f64,
    leading: f64,
}

impl Default for GraphicsState<'_> {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font: None,
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

static FALLBACK_FONT: Lazy<FontDecoder> = Lazy::new(FontDecoder::default);

struct TextCursor<'a> {
    fonts: &'a BTreeMap<Vec<u8>, FontDecoder>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    state: GraphicsState<'a>,
    saved: Vec<GraphicsState<'a>>,
    spans: Vec<TextSpan>,
}

impl<'a> TextCursor<'a> {
    fn new(fonts: &'a BTreeMap<Vec<u8>, FontDecoder>) -> Self {
        Self {
            fonts,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            state: GraphicsState::default(),
            saved: Vec::new(),
            spans: Vec::new(),
        }
    }

    fn run(mut self, operations: &[Operation]) -> Vec<TextSpan> {
        for op in operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => self.saved.push(self.state),
                "Q" => {
                    if let Some(state) = self.saved.pop() {
                        self.state = state;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix(operands) {
                        self.state.ctm = multiply(&m, &self.state.ctm);
                    }
                }
                "BT" => {
                    self.text_matrix = IDENTITY;
                    self.line_matrix = IDENTITY;
                }
                "Tf" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        self.state.font = self.fonts.get(name);
                    }
                    if let Some(size) = operands.get(1).and_then(number) {
                        self.state.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        self.state.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (
                        operands.first().and_then(number),
                        operands.get(1).and_then(number),
                    ) {
                        if op.operator == "TD" {
                            self.state.leading = -ty;
                        }
                        self.next_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix(operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "T*" => self.next_line(0.0, -self.state.leading),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let text = self.decode(bytes);
                        self.show(text, 0.0);
                    }
                }
                "'" => {
                    self.next_line(0.0, -self.state.leading);
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let text = self.decode(bytes);
                        self.show(text, 0.0);
                    }
                }
                "\"" => {
                    self.next_line(0.0, -self.state.leading);
                    if let Some(Object::String(bytes, _)) = operands.get(2) {
                        let text = self.decode(bytes);
                        self.show(text, 0.0);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let mut text = String::new();
                        let mut adjust = 0.0;
                        for item in items {
                            match item {
                                Object::String(bytes, _) => text.push_str(&self.decode(bytes)),
                                other => {
                                    if let Some(n) = number(other) {
                                        if n < -WORD_GAP {
                                            text.push(' ');
                                        }
                                        adjust -= n / 1000.0;
                                    }
                                }
                            }
                        }
                        self.show(text, adjust);
                    }
                }
                _ => {}
            }
        }

        self.spans
    }

    fn decode(&self, bytes: &[u8]) -> String {
        self.state.font.unwrap_or(&*FALLBACK_FONT).decode(bytes)
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    /// Emits `text` at the current position and moves past it. `extra_ems`
    /// is the horizontal adjustment collected from a TJ array.
    fn show(&mut self, text: String, extra_ems: f64) {
        let placed = multiply(&self.text_matrix, &self.state.ctm);
        let scale = placed[2].hypot(placed[3]);
        let size = if scale > 0.0 {
            self.state.font_size * scale
        } else {
            self.state.font_size
        };

        let ems = text.chars().count() as f64 * GLYPH_WIDTH_FACTOR + extra_ems;
        if !text.trim().is_empty() {
            self.spans.push(TextSpan::new(text, placed[4], placed[5], size));
        }

        let advance = ems * self.state.font_size;
        self.text_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, advance, 0.0], &self.text_matrix);
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn matrix(operands: &[Object]) -> Option<Matrix> {
    let values: Vec<f64> = operands.iter().filter_map(number).collect();
    match values[..] {
        [a, b, c, d, e, f] => Some([a, b, c, d, e, f]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatementParser;
    use lopdf::{Dictionary, Stream, StringFormat, dictionary};

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn numbers(values: &[i64]) -> Vec<Object> {
        values.iter().copied().map(Object::Integer).collect()
    }

    fn cursor_spans(operations: &[Operation]) -> Vec<TextSpan> {
        TextCursor::new(&BTreeMap::new()).run(operations)
    }

    fn text_at(x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("Td", numbers(&[x, y])),
            op("Tj", vec![Object::string_literal(text)]),
            op("ET", vec![]),
        ]
    }

    fn row_at(y: i64, cells: &[(i64, &str)]) -> Vec<Operation> {
        cells.iter().flat_map(|&(x, text)| text_at(x, y, text)).collect()
    }

    /// The statement page laid out top-down, one `(y, cells)` entry per row.
    fn statement_rows() -> Vec<(i64, Vec<(i64, &'static str)>)> {
        vec![
            (700, vec![(40, "Transactions")]),
            (685, vec![(40, "Date"), (110, "Description"), (300, "Daily Cash"), (460, "Amount")]),
            (
                670,
                vec![(40, "09/01/2019"), (110, "Store A"), (300, "2%"), (380, "$0.10"), (460, "$5.00")],
            ),
            (
                655,
                vec![(40, "09/02/2019"), (110, "Store B"), (300, "3%"), (380, "$0.30"), (460, "$10.00")],
            ),
        ]
    }

    fn helvetica(_: &mut Document) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }
    }

    fn write_pdf(path: &Path, pages: Vec<Vec<Operation>>) {
        write_pdf_with_font(path, helvetica, pages);
    }

    /// Writes a PDF with one page per entry in `pages`, all sharing the font
    /// `F1` built by `font`.
    fn write_pdf_with_font(path: &Path, font: impl FnOnce(&mut Document) -> Dictionary, pages: Vec<Vec<Operation>>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font = font(&mut doc);
        let font_id = doc.add_object(font);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn assert_statement_table(tables: &[Table]) {
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, Some(2));
        assert_eq!(tables[0].rows[0][0], "Transactions");
        assert_eq!(tables[0].rows[1], vec!["Date", "Description", "Daily Cash", "", "Amount"]);
        assert_eq!(tables[0].rows[2], vec!["09/01/2019", "Store A", "2%", "$0.10", "$5.00"]);
        assert_eq!(tables[0].rows[3], vec!["09/02/2019", "Store B", "3%", "$0.30", "$10.00"]);
    }

    #[test]
    fn test_cursor_tracks_td_and_tf() {
        let spans = cursor_spans(&text_at(40, 700, "Transactions"));

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Transactions");
        assert_eq!(spans[0].x, 40.0);
        assert_eq!(spans[0].y, 700.0);
        assert_eq!(spans[0].font_size, 10.0);
    }

    #[test]
    fn test_cursor_leading_moves_down() {
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]),
            op("TL", numbers(&[14])),
            op("Td", numbers(&[40, 700])),
            op("Tj", vec![Object::string_literal("first")]),
            op("T*", vec![]),
            op("Tj", vec![Object::string_literal("second")]),
            op("ET", vec![]),
        ];

        let spans = cursor_spans(&ops);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].x, 40.0);
        assert_eq!(spans[1].y, 686.0);
    }

    #[test]
    fn test_cursor_tj_array_joins_text() {
        let ops = vec![
            op("BT", vec![]),
            op("Tm", numbers(&[10, 0, 0, 10, 100, 500])),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Daily"),
                    Object::Integer(-300),
                    Object::string_literal("Cash"),
                ])],
            ),
            op("ET", vec![]),
        ];

        let spans = cursor_spans(&ops);

        assert_eq!(spans[0].text, "Daily Cash");
        assert_eq!(spans[0].x, 100.0);
        assert_eq!(spans[0].font_size, 120.0);
    }

    #[test]
    fn test_cursor_applies_and_restores_ctm() {
        let mut ops = vec![op("q", vec![]), op("cm", numbers(&[2, 0, 0, 2, 0, 0]))];
        ops.extend(text_at(10, 20, "scaled"));
        ops.push(op("Q", vec![]));
        ops.extend(text_at(10, 20, "plain"));

        let spans = cursor_spans(&ops);

        assert_eq!((spans[0].x, spans[0].y, spans[0].font_size), (20.0, 40.0, 20.0));
        assert_eq!((spans[1].x, spans[1].y, spans[1].font_size), (10.0, 20.0, 10.0));
    }

    #[test]
    fn test_cursor_flipped_page_keeps_reading_order() {
        let mut ops = vec![op("q", vec![]), op("cm", numbers(&[1, 0, 0, -1, 0, 792]))];
        for (y, text) in [(92, "top"), (107, "bottom")] {
            ops.push(op("BT", vec![]));
            ops.push(op("Tm", numbers(&[1, 0, 0, -1, 40, y])));
            ops.push(op("Tj", vec![Object::string_literal(text)]));
            ops.push(op("ET", vec![]));
        }
        ops.push(op("Q", vec![]));

        let spans = cursor_spans(&ops);

        assert_eq!(spans[0].y, 700.0);
        assert_eq!(spans[1].y, 685.0);
        assert_eq!(spans[0].font_size, 12.0);
    }

    #[test]
    fn test_tables_skip_first_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.pdf");

        let summary = row_at(700, &[(40, "Summary"), (300, "$99.00")]);
        let detail = statement_rows()
            .iter()
            .flat_map(|(y, cells)| row_at(*y, cells))
            .collect();
        write_pdf(&path, vec![summary, detail]);

        let pdf = PdfDocument::open(&path).unwrap();
        assert_eq!(pdf.page_count(), 2);

        assert_statement_table(&pdf.tables(PageRange::default()).unwrap());
    }

    #[test]
    fn test_tables_on_flipped_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flipped.pdf");

        let mut detail = vec![op("q", vec![]), op("cm", numbers(&[1, 0, 0, -1, 0, 792]))];
        for (y, cells) in statement_rows() {
            for (x, text) in cells {
                detail.push(op("BT", vec![]));
                detail.push(op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]));
                detail.push(op("Tm", numbers(&[1, 0, 0, -1, x, 792 - y])));
                detail.push(op("Tj", vec![Object::string_literal(text)]));
                detail.push(op("ET", vec![]));
            }
        }
        detail.push(op("Q", vec![]));
        write_pdf(&path, vec![row_at(700, &[(40, "Summary")]), detail]);

        let pdf = PdfDocument::open(&path).unwrap();
        assert_statement_table(&pdf.tables(PageRange::default()).unwrap());

        let statement = StatementParser::default().parse_source(&pdf).unwrap();
        assert_eq!(statement.transaction_count(), 2);
    }

    /// Codes are the character plus 0x100, so only the CMap gives them back.
    fn cid_bytes(text: &str) -> Vec<u8> {
        text.chars()
            .flat_map(|c| (0x100 + c as u16).to_be_bytes())
            .collect()
    }

    fn cid_font(doc: &mut Document) -> Dictionary {
        let cmap = b"1 begincodespacerange <0000> <FFFF> endcodespacerange
1 beginbfrange <0100> <017F> <0000> endbfrange"
            .to_vec();
        let cmap_id = doc.add_object(Stream::new(dictionary! {}, cmap));
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ABCDEF+Helvetica",
            "Encoding" => "Identity-H",
            "ToUnicode" => cmap_id,
        }
    }

    #[test]
    fn test_tables_with_two_byte_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cid.pdf");

        let mut detail = Vec::new();
        for (y, cells) in statement_rows() {
            for (x, text) in cells {
                detail.push(op("BT", vec![]));
                detail.push(op("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(10)]));
                detail.push(op("Td", numbers(&[x, y])));
                detail.push(op("Tj", vec![Object::String(cid_bytes(text), StringFormat::Hexadecimal)]));
                detail.push(op("ET", vec![]));
            }
        }
        write_pdf_with_font(&path, cid_font, vec![Vec::new(), detail]);

        let pdf = PdfDocument::open(&path).unwrap();
        assert_statement_table(&pdf.tables(PageRange::default()).unwrap());

        let statement = StatementParser::default().parse_source(&pdf).unwrap();
        assert_eq!(statement.transaction_count(), 2);
        assert_eq!(statement.rows()[1].description, "Store B");
    }

    #[test]
    fn test_tables_past_last_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("single.pdf");
        write_pdf(&path, vec![row_at(700, &[(40, "Summary")])]);

        let pdf = PdfDocument::open(&path).unwrap();
        assert!(pdf.tables(PageRange::default()).unwrap().is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        assert!(PdfDocument::open("/nonexistent/statement.pdf").is_err());
    }
}
