use super::types::{InputColumn, is_date, parse_amount, parse_percent};
use crate::{errors::StatementResult, types::LedgerRow};

/// Marker printed in the description column of the row that follows a refund.
pub const DAILY_CASH_ADJUSTMENT: &str = "Daily Cash Adjustment";

/// Read-only view over the cells of one extracted row.
///
/// Cells missing at the end of a ragged row read as empty text.
#[derive(Debug, Clone, Copy)]
pub struct StatementRow<'a> {
    cells: &'a [String],
}

impl<'a> StatementRow<'a> {
    pub fn new(cells: &'a [String]) -> Self {
        Self { cells }
    }

    pub fn cell(&self, column: InputColumn) -> &'a str {
        self.cells
            .get(column.index())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn first_cell(&self) -> &'a str {
        self.cell(InputColumn::Date)
    }

    pub fn starts_transaction(&self) -> bool {
        is_date(self.first_cell())
    }

    pub fn is_daily_cash_adjustment(&self) -> bool {
        self.cell(InputColumn::ADJUSTMENT_MARKER) == DAILY_CASH_ADJUSTMENT
    }

    /// Converts the row into a ledger line. The date is taken from `date`
    /// when given, which is how an adjustment inherits its parent's date.
    pub fn to_ledger_row(&self, date: Option<&str>, negate_amounts: bool) -> StatementResult<LedgerRow> {
        Ok(LedgerRow::new(
            date.unwrap_or_else(|| self.cell(InputColumn::Date)),
            self.cell(InputColumn::Description),
            parse_percent(self.cell(InputColumn::BonusPercent))?,
            parse_amount(self.cell(InputColumn::BonusAmount), false)?,
            parse_amount(self.cell(InputColumn::Amount), negate_amounts)?,
        ))
    }
}

/// Maps one transaction row onto the ledger layout.
pub fn transform_row(cells: &[String], negate_amounts: bool) -> StatementResult<LedgerRow> {
    StatementRow::new(cells).to_ledger_row(None, negate_amounts)
}
