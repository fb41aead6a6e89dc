use std::ops::RangeInclusive;

use crate::{
    errors::{StatementParseError, StatementResult},
    parsers::pdf::Table,
};

/// Inclusive, 1-based range of pages. `last: None` runs to the end of the
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: usize,
    pub last: Option<usize>,
}

impl PageRange {
    /// The first page of a statement is the account summary.
    pub const SKIP_SUMMARY: PageRange = PageRange { first: 2, last: None };

    pub fn new(first: usize, last: Option<usize>) -> StatementResult<Self> {
        let range = Self { first, last };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> StatementResult<()> {
        let reversed = self.last.is_some_and(|last| last < self.first);
        if self.first == 0 || reversed {
            return Err(StatementParseError::InvalidPageRange {
                first: self.first,
                last: self.last,
            });
        }
        Ok(())
    }

    pub fn contains(&self, page: usize) -> bool {
        page >= self.first && self.last.is_none_or(|last| page <= last)
    }

    /// Pages of a `page_count`-page document that fall in the range.
    pub fn pages(&self, page_count: usize) -> RangeInclusive<usize> {
        let last = self.last.map_or(page_count, |last| last.min(page_count));
        self.first..=last
    }
}

impl Default for PageRange {
    fn default() -> Self {
        Self::SKIP_SUMMARY
    }
}

/// Anything that can hand over the tables of a document, in document order.
pub trait TableSource {
    fn tables(&self, pages: PageRange) -> StatementResult<Vec<Table>>;
}

/// Tables already in memory. Tables that know their page are filtered by
/// the range, the rest are always returned.
impl TableSource for Vec<Table> {
    fn tables(&self, pages: PageRange) -> StatementResult<Vec<Table>> {
        pages.validate()?;
        Ok(self
            .iter()
            .filter(|t| t.page.is_none_or(|page| pages.contains(page)))
            .cloned()
            .collect())
    }
}
