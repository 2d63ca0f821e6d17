use crate::models::columns::*;
use crate::{cascade, quote, CellValue, PriceFields, Row};
use chrono::Months;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How the price back-fill treats a row's existing discount percentage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountPolicy {
    /// Always write the 10% baseline discount.
    #[default]
    FixedBaseline,
    /// Keep a non-zero Discount Percentage already on the row.
    PreserveExisting,
}

const PRICE_KEYS: [&str; 3] = [PRODUCT_PRICE, PRICE_AFTER_IVU, IVU_TAX];

fn blank(row: &Row, key: &str) -> bool {
    row.get(key).map(CellValue::is_blank).unwrap_or(true)
}

fn has_product_id(row: &Row) -> bool {
    !blank(row, PRODUCT_ID)
}

pub fn needs_price_backfill(row: &Row) -> bool {
    has_product_id(row) && PRICE_KEYS.iter().any(|k| blank(row, k))
}

/// Price fields for a row whose prices are missing.
pub fn backfilled_prices(fair_market_value: Decimal, existing_pct: Decimal, policy: DiscountPolicy) -> PriceFields {
    let q = quote(fair_market_value);
    match policy {
        DiscountPolicy::PreserveExisting if existing_pct > Decimal::ZERO => {
            cascade(q.total_price, Decimal::ZERO, existing_pct)
        }
        _ => q.with_baseline_discount(),
    }
}

/// Fills price columns on every row missing one of Product Price,
/// Product Price After IVU or IVU Tax. Returns how many rows changed.
pub fn backfill_prices(rows: &mut [Row], policy: DiscountPolicy) -> usize {
    let mut changed = 0;
    for row in rows.iter_mut().filter(|r| needs_price_backfill(r)) {
        let fmv = row.get(FAIR_MARKET_VALUE).map(CellValue::as_decimal).unwrap_or_default();
        let existing_pct = row
            .get(DISCOUNT_PERCENTAGE)
            .map(CellValue::as_decimal)
            .unwrap_or_default();

        let fields = backfilled_prices(fmv, existing_pct, policy);
        if existing_pct > Decimal::ZERO && existing_pct != fields.discount_percentage {
            let id = row.get(PRODUCT_ID).map(CellValue::as_text).unwrap_or_default();
            warn!(product_id = %id, %existing_pct, "existing discount percentage replaced by baseline");
        }
        fields.apply_to_row(row);
        changed += 1;
    }
    info!(rows = changed, ?policy, "prices back-filled");
    changed
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlankFill {
    pub asin: usize,
    pub to_sell_after: usize,
}

/// ASIN from the last path segment of Order Link, and To Sell After six
/// months after Order Date, wherever those cells are blank.
pub fn fill_blank_fields(rows: &mut [Row]) -> BlankFill {
    let mut filled = BlankFill::default();
    for row in rows.iter_mut().filter(|r| has_product_id(r)) {
        if blank(row, ASIN) {
            let link = row.get(ORDER_LINK).map(CellValue::as_text).unwrap_or_default();
            if let Some(asin) = asin_from_link(&link) {
                row.insert(ASIN.to_string(), CellValue::Text(asin));
                filled.asin += 1;
            }
        }
        if blank(row, TO_SELL_AFTER) {
            let ordered = row.get(ORDER_DATE).and_then(|c| c.as_date().ok().flatten());
            if let Some(date) = ordered.and_then(|d| d.checked_add_months(Months::new(6))) {
                row.insert(TO_SELL_AFTER.to_string(), CellValue::Date(date));
                filled.to_sell_after += 1;
            }
        }
    }
    info!(asin = filled.asin, to_sell_after = filled.to_sell_after, "blank fields filled");
    filled
}

pub fn asin_from_link(link: &str) -> Option<String> {
    if !link.contains('/') {
        return None;
    }
    link.rsplit('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
