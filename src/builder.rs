use std::path::Path;

use crate::{
    errors::StatementResult,
    parsers::prelude::*,
    types::Statement,
};

/// Options that drive one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Flip the sign of the amount column so charges come out negative.
    pub negate_amounts: bool,
    pub pages: PageRange,
}

#[derive(Debug, Default)]
pub struct StatementParserBuilder {
    negate_amounts: bool,
    first_page: Option<usize>,
    last_page: Option<usize>,
}

impl StatementParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn negate_amounts(mut self, negate: bool) -> Self {
        self.negate_amounts = negate;
        self
    }

    pub fn first_page(mut self, page: usize) -> Self {
        self.first_page = Some(page);
        self
    }

    pub fn last_page(mut self, page: usize) -> Self {
        self.last_page = Some(page);
        self
    }

    pub fn build(self) -> StatementResult<StatementParser> {
        let first = self.first_page.unwrap_or(PageRange::SKIP_SUMMARY.first);
        let pages = PageRange::new(first, self.last_page)?;

        Ok(StatementParser {
            options: ParseOptions {
                negate_amounts: self.negate_amounts,
                pages,
            },
        })
    }
}

/// Turns the tables of one statement into ledger rows.
///
/// Every call starts from an empty [`Statement`], so one parser can be reused
/// across documents.
#[derive(Debug, Clone, Default)]
pub struct StatementParser {
    options: ParseOptions,
}

impl StatementParser {
    pub fn builder() -> StatementParserBuilder {
        StatementParserBuilder::new()
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn parse_file(&self, path: impl AsRef<Path>) -> StatementResult<Statement> {
        let document = PdfDocument::open(path)?;
        self.parse_source(&document)
    }

    pub fn parse_source<S: TableSource + ?Sized>(&self, source: &S) -> StatementResult<Statement> {
        let tables = source.tables(self.options.pages)?;
        self.parse_tables(&tables)
    }

    /// Runs every table through the header search and transaction scan, in
    /// order. A malformed field anywhere aborts the whole statement.
    pub fn parse_tables(&self, tables: &[Table]) -> StatementResult<Statement> {
        tracing::info!("Tables:  {}", tables.len());

        let mut statement = Statement::new();
        for (label, table) in tables.iter().enumerate() {
            if let Some(outcome) = parse_table(label, table, self.options.negate_amounts)? {
                statement.extend(outcome.rows, outcome.transactions);
            }
        }

        tracing::info!("{} transactions", statement.transaction_count());
        Ok(statement)
    }
}
