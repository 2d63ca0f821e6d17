use crate::{bounded_money, round_cents, PriceFields, TAX_RATE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Which half of the discount pair survives a change of the base price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountAnchor {
    /// Keep the absolute discount, recompute the percentage.
    Amount,
    /// Keep the percentage, recompute the absolute discount.
    Percentage,
}

/// A user edit to one side of the discount pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscountChange {
    Amount(Decimal),
    Percentage(Decimal),
}

pub fn recalc_from_percentage(price: Decimal, percentage: Decimal) -> Decimal {
    match price.checked_mul(percentage) {
        Some(p) => round_cents(p / Decimal::ONE_HUNDRED),
        None => {
            warn!(%price, %percentage, "discount amount overflowed, using 0");
            Decimal::ZERO
        }
    }
}

/// Percentage equivalent of `amount`. A zero price yields 0%.
pub fn recalc_from_amount(price: Decimal, amount: Decimal) -> Decimal {
    if price.is_zero() {
        warn!(%amount, "discount percentage requested against a zero price, using 0%");
        return Decimal::ZERO;
    }
    match amount
        .checked_div(price)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(p) => round_cents(p),
        None => {
            warn!(%price, %amount, "discount percentage overflowed, using 0%");
            Decimal::ZERO
        }
    }
}

/// Recomputes every price column from the price-with-tax and the discount pair.
///
/// The pre-tax price and tax are re-derived from `price_after_ivu`, so the
/// returned `price_after_ivu` is always `product_price + ivu_tax`. A positive
/// `amount` wins over `percentage` when both are present. Out-of-range
/// inputs count as zero.
pub fn cascade(price_after_ivu: Decimal, amount: Decimal, percentage: Decimal) -> PriceFields {
    let (price_after_ivu, amount, percentage) = (
        bounded_money(price_after_ivu),
        bounded_money(amount),
        bounded_money(percentage),
    );
    let original_price = round_cents(price_after_ivu / (Decimal::ONE + TAX_RATE));
    let ivu_tax = round_cents(original_price * TAX_RATE);
    let price_with_tax = original_price + ivu_tax;

    let has_discount = amount > Decimal::ZERO || percentage > Decimal::ZERO;
    if !has_discount {
        return PriceFields {
            product_price: original_price,
            ivu_tax,
            price_after_ivu: price_with_tax,
            discount: Decimal::ZERO,
            discount_percentage: Decimal::ZERO,
            price_after_discount: original_price,
            ivu_after_discount: ivu_tax,
            price_after_ivu_and_discount: price_with_tax,
        };
    }

    let discount_amount = if amount > Decimal::ZERO {
        amount
    } else {
        recalc_from_percentage(original_price, percentage)
    };
    let price_after_discount = round_cents(original_price - discount_amount);
    let ivu_after_discount = round_cents(price_after_discount * TAX_RATE);

    PriceFields {
        product_price: original_price,
        ivu_tax,
        price_after_ivu: price_with_tax,
        discount: discount_amount,
        discount_percentage: percentage,
        price_after_discount,
        ivu_after_discount,
        price_after_ivu_and_discount: round_cents(price_after_discount + ivu_after_discount),
    }
}

/// Applies an edit to the discount pair; the other half is recomputed from
/// the current product price and the whole group cascades.
pub fn apply_discount_change(current: &PriceFields, change: DiscountChange) -> PriceFields {
    let price = current.product_price;
    let (amount, percentage) = match change {
        DiscountChange::Amount(a) => (a, percentage_for(price, a)),
        DiscountChange::Percentage(p) => (recalc_from_percentage(price, p), p),
    };
    info!(?change, %amount, %percentage, "discount recalculated");
    cascade(current.price_after_ivu, amount, percentage)
}

fn percentage_for(price: Decimal, amount: Decimal) -> Decimal {
    if amount.is_zero() {
        Decimal::ZERO
    } else {
        recalc_from_amount(price, amount)
    }
}

/// True when a new price-with-tax would invalidate one half of the discount pair.
pub fn needs_anchor(current: &PriceFields, new_price_after_ivu: Decimal) -> bool {
    current.has_discount() && current.price_after_ivu != new_price_after_ivu
}

/// Moves the group to a new price-with-tax, keeping the `anchor` half of
/// the discount pair. A blank or zero price wipes the whole group.
pub fn reprice(
    current: &PriceFields,
    new_price_after_ivu: Option<Decimal>,
    anchor: DiscountAnchor,
) -> PriceFields {
    let new_price = match new_price_after_ivu {
        Some(p) if p > Decimal::ZERO => p,
        _ => {
            info!("price cleared, resetting price fields");
            return PriceFields::zeroed();
        }
    };

    let original_price = round_cents(new_price / (Decimal::ONE + TAX_RATE));
    let (amount, percentage) = match anchor {
        DiscountAnchor::Amount => (
            current.discount,
            percentage_for(original_price, current.discount),
        ),
        DiscountAnchor::Percentage => (
            recalc_from_percentage(original_price, current.discount_percentage),
            current.discount_percentage,
        ),
    };
    info!(%new_price, ?anchor, %amount, %percentage, "repricing");
    cascade(new_price, amount, percentage)
}
