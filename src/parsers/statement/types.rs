use crate::errors::{StatementParseError, StatementResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?)(\d+)%$").unwrap());
static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(-?)\$(\d+\.\d+)$").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap());

/// Columns of a transaction row as the statement lays them out.
///
/// The daily cash adjustment marker is printed in the description column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputColumn {
    Date = 0,
    Description = 1,
    BonusPercent = 2,
    BonusAmount = 3,
    Amount = 4,
}

impl InputColumn {
    pub const ADJUSTMENT_MARKER: InputColumn = InputColumn::Description;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Parses a daily cash rate such as `2%` into the fraction `0.02`.
///
/// An empty cell means no bonus and yields zero.
pub fn parse_percent(text: &str) -> StatementResult<Decimal> {
    if text.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let caps = PERCENT_RE
        .captures(text)
        .ok_or_else(|| StatementParseError::InvalidPercent(text.to_string()))?;

    let whole: i64 = caps[2]
        .parse()
        .map_err(|_| StatementParseError::InvalidPercentValue(text.to_string()))?;

    let value = Decimal::new(whole, 2);
    let signed = if &caps[1] == "-" { -value } else { value };
    Ok(signed.normalize())
}

/// Parses a dollar amount such as `-$5.00`.
///
/// With `negate` set the sign is flipped after parsing, so charges come out
/// negative and credits positive. An empty cell yields zero.
pub fn parse_amount(text: &str, negate: bool) -> StatementResult<Decimal> {
    if text.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let caps = AMOUNT_RE
        .captures(text)
        .ok_or_else(|| StatementParseError::InvalidAmount(text.to_string()))?;

    let mut value = Decimal::from_str(&caps[2])
        .map_err(|_| StatementParseError::InvalidAmountValue(text.to_string()))?;

    if &caps[1] == "-" {
        value = -value;
    }
    if negate {
        value = -value;
    }
    Ok(value)
}

/// `true` for `MM/DD/YYYY` text. Only the shape is checked.
pub fn is_date(text: &str) -> bool {
    DATE_RE.is_match(text)
}
