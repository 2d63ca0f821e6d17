use crate::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Largest magnitude accepted as a money or percentage value.
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Date layout used by the spreadsheet and by every user-entered date.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// A spreadsheet cell as read from or written to the workbook.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Number(Decimal),
    Text(String),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Anything unparseable reads as zero.
    pub fn as_decimal(&self) -> Decimal {
        match self {
            CellValue::Number(n) => bounded_money(*n),
            CellValue::Text(s) => parse_money(s),
            _ => Decimal::ZERO,
        }
    }

    /// `YES`/`TRUE`/`1` (any case) and non-zero numbers are true.
    pub fn as_bool(&self) -> bool {
        match self {
            CellValue::Text(s) => matches!(s.trim().to_lowercase().as_str(), "yes" | "true" | "1"),
            CellValue::Number(n) => !n.is_zero(),
            _ => false,
        }
    }

    pub fn as_date(&self) -> Result<Option<NaiveDate>, CoreError> {
        match self {
            CellValue::Empty => Ok(None),
            CellValue::Date(d) => Ok(Some(*d)),
            CellValue::Text(s) if s.trim().is_empty() => Ok(None),
            CellValue::Text(s) => parse_date(s).map(Some),
            CellValue::Number(n) => Err(CoreError::Date(n.to_string())),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.normalize().to_string(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn from_bool(b: bool) -> Self {
        CellValue::Text(if b { "YES" } else { "NO" }.to_string())
    }

    pub fn from_text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    pub fn from_date(d: Option<NaiveDate>) -> Self {
        d.map(CellValue::Date).unwrap_or_default()
    }
}

/// `d`, or zero when its magnitude exceeds [`MONEY_LIMIT`].
pub fn bounded_money(d: Decimal) -> Decimal {
    if d.abs() > MONEY_LIMIT {
        warn!(value = %d, "amount out of range, using 0");
        Decimal::ZERO
    } else {
        d
    }
}

/// Lenient money/percentage parser: strips `$`, `%`, `,` and whitespace.
/// Empty, malformed or out-of-range input is zero.
pub fn parse_money(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '%' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    let parsed = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or(Decimal::ZERO);
    bounded_money(parsed)
}

/// Strict date parser for user input. Accepts `MM/DD/YYYY` and ISO `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let s = raw.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d"))
        .map_err(|_| CoreError::Date(s.to_string()))
}

pub fn format_money(d: Decimal) -> String {
    format!("${:.2}", crate::round_cents(d))
}

pub fn format_percent(d: Decimal) -> String {
    format!("{:.2}%", crate::round_cents(d))
}
