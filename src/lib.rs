//! Convert a credit card PDF statement into a CSV ledger.
//!
//! ```rust,ignore
//! use card_statement_rs::{StatementParser, write_csv};
//!
//! let statement = StatementParser::builder()
//!     .negate_amounts(true)
//!     .build()?
//!     .parse_file("statement.pdf")?;
//! write_csv(&statement, "statement.csv")?;
//! ```

mod builder;
mod types;
mod writer;

pub mod errors;
pub mod parsers;

pub use builder::{ParseOptions, StatementParser, StatementParserBuilder};
pub use parsers::prelude::*;
pub use types::{LEDGER_HEADER, LedgerRow, Statement};
pub use writer::{dump_tables, write_csv};
