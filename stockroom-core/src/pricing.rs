use crate::PriceFields;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

/// IVU consumption tax, 11.5%.
pub const TAX_RATE: Decimal = Decimal::from_parts(115, 0, 0, false, 3);
/// Baseline discount applied by the bulk price back-fill, 10%.
pub const BASELINE_DISCOUNT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
/// List prices are rounded up to a multiple of this.
pub const LIST_PRICE_STEP: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Half-up rounding to two decimal places.
pub fn round_cents(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceQuote {
    pub regular_product_price: Decimal,
    pub total_price: Decimal,
    pub ivu_tax: Decimal,
    pub price_discount: Decimal,
}

impl PriceQuote {
    /// Expands the quote into all price columns, carrying the baseline
    /// discount through the "after discount" triple.
    pub fn with_baseline_discount(&self) -> PriceFields {
        let after_discount = round_cents(self.regular_product_price - self.price_discount);
        let ivu_after = round_cents(after_discount * TAX_RATE);
        PriceFields {
            product_price: self.regular_product_price,
            ivu_tax: self.ivu_tax,
            price_after_ivu: self.total_price,
            discount: self.price_discount,
            discount_percentage: BASELINE_DISCOUNT_RATE * Decimal::ONE_HUNDRED,
            price_after_discount: after_discount,
            ivu_after_discount: ivu_after,
            price_after_ivu_and_discount: round_cents(after_discount + ivu_after),
        }
    }
}

/// Derives the regular price, tax and baseline discount from a fair market value.
///
/// Negative or out-of-range input is treated like the malformed-input case
/// and prices as zero.
pub fn quote(fair_market_value: Decimal) -> PriceQuote {
    let fmv = crate::bounded_money(fair_market_value).max(Decimal::ZERO);
    checked_quote(fmv).unwrap_or_else(|| {
        warn!(%fmv, "price quote overflowed, using 0");
        PriceQuote {
            regular_product_price: Decimal::ZERO,
            total_price: Decimal::ZERO,
            ivu_tax: Decimal::ZERO,
            price_discount: Decimal::ZERO,
        }
    })
}

fn checked_quote(fmv: Decimal) -> Option<PriceQuote> {
    let list_price = round_cents(fmv.checked_div(Decimal::ONE - TAX_RATE)?);
    let rounded_list_price = list_price
        .checked_div(LIST_PRICE_STEP)?
        .ceil()
        .checked_mul(LIST_PRICE_STEP)?;

    let regular_product_price =
        round_cents(rounded_list_price.checked_div(Decimal::ONE + TAX_RATE)?);
    let ivu_tax = round_cents(regular_product_price.checked_mul(TAX_RATE)?);
    let price_discount = round_cents(regular_product_price.checked_mul(BASELINE_DISCOUNT_RATE)?);
    let total_price = regular_product_price.checked_add(ivu_tax)?;

    debug!(
        %fmv, %list_price, %rounded_list_price, %regular_product_price, %ivu_tax, %total_price,
        "price quote"
    );

    Some(PriceQuote {
        regular_product_price,
        total_price,
        ivu_tax,
        price_discount,
    })
}

/// Lenient entry point for raw user or cell text.
pub fn quote_str(fair_market_value: &str) -> PriceQuote {
    quote(crate::parse_money(fair_market_value))
}
