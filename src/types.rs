use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Header of the ledger CSV, in column order.
pub const LEDGER_HEADER: [&str; 9] = [
    "Date",
    "Description",
    "Category",
    "Note",
    "S",
    "%",
    "Cash",
    "Amount",
    "Split",
];

/// One line of the output ledger.
///
/// Category, note, shared and split are left empty for manual
/// categorisation once the CSV is opened in a spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Note")]
    pub note: String,
    #[serde(rename = "S")]
    pub shared: String,
    /// Daily cash rate as a fraction (`0.02` for `2%`).
    #[serde(rename = "%")]
    pub bonus_percent: Decimal,
    #[serde(rename = "Cash")]
    pub bonus_amount: Decimal,
    #[serde(rename = "Amount")]
    pub amount: Decimal,
    #[serde(rename = "Split")]
    pub split: String,
}

impl LedgerRow {
    /// Builds a row with every placeholder column left empty.
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        bonus_percent: Decimal,
        bonus_amount: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            category: String::new(),
            note: String::new(),
            shared: String::new(),
            bonus_percent,
            bonus_amount,
            amount,
            split: String::new(),
        }
    }

    /// Statement dates are printed as `MM/DD/YYYY`.
    pub fn posted_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%m/%d/%Y").ok()
    }
}

/// All ledger rows parsed from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    rows: Vec<LedgerRow>,
    transaction_count: usize,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the rows of one table. `transactions` excludes daily cash
    /// adjustment rows.
    pub fn extend(&mut self, rows: Vec<LedgerRow>, transactions: usize) {
        self.rows.extend(rows);
        self.transaction_count += transactions;
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<LedgerRow> {
        self.rows
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest posting date, ignoring rows whose date is not a
    /// real calendar day.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.rows.iter().filter_map(LedgerRow::posted_on);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}
