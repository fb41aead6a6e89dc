use super::dto::StatementRow;
use crate::{errors::StatementResult, parsers::pdf::Table, types::LedgerRow};

/// Title row printed above the transaction table.
pub const TRANSACTIONS_TITLE: &str = "Transactions";

/// Column header row printed right below the title.
pub const TRANSACTIONS_HEADER: [&str; 5] = ["Date", "Description", "Daily Cash", "", "Amount"];

/// Rows produced by scanning part of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    pub rows: Vec<LedgerRow>,
    /// Transactions parsed, daily cash adjustments excluded.
    pub transactions: usize,
    /// Index one past the last row consumed.
    pub end: usize,
}

/// Parses transaction rows starting at `start`.
///
/// A row whose first cell is a date opens a transaction. When the row right
/// after it is a daily cash adjustment, that row is emitted with the parent's
/// date and consumed along with it. Anything else is skipped.
pub fn scan_transactions(
    label: usize,
    rows: &[Vec<String>],
    start: usize,
    negate_amounts: bool,
) -> StatementResult<ScanOutcome> {
    let mut outcome = ScanOutcome::default();
    let mut i = start;

    while i < rows.len() {
        let row = StatementRow::new(&rows[i]);

        if row.starts_transaction() {
            outcome.rows.push(row.to_ledger_row(None, negate_amounts)?);
            outcome.transactions += 1;

            if let Some(next) = rows.get(i + 1).map(|cells| StatementRow::new(cells)) {
                if next.is_daily_cash_adjustment() {
                    outcome
                        .rows
                        .push(next.to_ledger_row(Some(row.first_cell()), negate_amounts)?);
                    i += 1;
                }
            }
        } else {
            tracing::info!("  {}:    Skipping '{}'", label, row.first_cell());
        }

        i += 1;
    }

    outcome.end = i;
    Ok(outcome)
}

/// Finds the row holding the transactions title followed by the column header.
///
/// Only the first match is returned; a second transaction block further down
/// the same table is not looked for.
pub fn find_transactions_header(rows: &[Vec<String>]) -> Option<usize> {
    if rows.len() < 3 {
        return None;
    }

    (0..rows.len() - 2).find(|&ri| {
        rows[ri].first().map(String::as_str) == Some(TRANSACTIONS_TITLE)
            && rows[ri + 1].iter().map(String::as_str).eq(TRANSACTIONS_HEADER)
    })
}

/// Parses one extracted table. Tables without the transaction header give
/// `None`.
pub fn parse_table(label: usize, table: &Table, negate_amounts: bool) -> StatementResult<Option<ScanOutcome>> {
    let rows = &table.rows;

    if rows.len() < 3 {
        tracing::info!("  {}:  too short", label);
        return Ok(None);
    }

    let Some(at) = find_transactions_header(rows) else {
        tracing::debug!("  {}:  no transaction header in {} rows", label, rows.len());
        return Ok(None);
    };

    tracing::info!("  {}:  Extract row {}: {}", label, at + 1, rows[at + 1].join(","));

    let outcome = scan_transactions(label, rows, at + 2, negate_amounts)?;

    let end_note = rows
        .get(outcome.end)
        .map(|row| row.join(","))
        .unwrap_or_else(|| "(last)".to_string());
    tracing::info!(
        "  {}:  {} Transactions, End at row {}:  {}",
        label,
        outcome.transactions,
        outcome.end,
        end_note
    );

    Ok(Some(outcome))
}
