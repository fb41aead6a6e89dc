pub mod dto;
pub mod parser;
pub mod types;

pub mod prelude {
    pub use super::dto::{DAILY_CASH_ADJUSTMENT, StatementRow, transform_row};
    pub use super::parser::{ScanOutcome, parse_table, scan_transactions};
    pub use super::types::{InputColumn, is_date, parse_amount, parse_percent};
}
