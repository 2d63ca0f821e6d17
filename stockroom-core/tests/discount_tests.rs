use rust_decimal::Decimal;
use std::str::FromStr;
use stockroom_core::{
    apply_discount_change, cascade, needs_anchor, recalc_from_amount, recalc_from_percentage,
    reprice, DiscountAnchor, DiscountChange, PriceFields,
};

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn percentage_and_amount_round_trip() {
    assert_eq!(recalc_from_percentage(d("100.00"), d("10")), d("10.00"));
    assert_eq!(recalc_from_amount(d("100.00"), d("10.00")), d("10.00"));
}

#[test]
fn zero_price_gives_zero_percentage() {
    assert_eq!(recalc_from_amount(Decimal::ZERO, d("5")), Decimal::ZERO);
}

#[test]
fn cascade_from_percentage() {
    let f = cascade(d("30.00"), Decimal::ZERO, d("10"));
    assert_eq!(f.product_price, d("26.91"));
    assert_eq!(f.ivu_tax, d("3.09"));
    assert_eq!(f.price_after_ivu, d("30.00"));
    assert_eq!(f.discount, d("2.69"));
    assert_eq!(f.price_after_discount, d("24.22"));
    assert_eq!(f.ivu_after_discount, d("2.79"));
    assert_eq!(f.price_after_ivu_and_discount, d("27.01"));
}

#[test]
fn cascade_prefers_amount_when_both_present() {
    let f = cascade(d("30.00"), d("5"), d("10"));
    assert_eq!(f.discount, d("5"));
    assert_eq!(f.price_after_discount, d("21.91"));
    assert_eq!(f.ivu_after_discount, d("2.52"));
    assert_eq!(f.price_after_ivu_and_discount, d("24.43"));
}

#[test]
fn cascade_without_discount_mirrors_base_fields() {
    let f = cascade(d("55.75"), Decimal::ZERO, Decimal::ZERO);
    assert_eq!(f.product_price, d("50.00"));
    assert_eq!(f.price_after_discount, f.product_price);
    assert_eq!(f.ivu_after_discount, f.ivu_tax);
    assert_eq!(f.price_after_ivu_and_discount, f.price_after_ivu);
    assert!(!f.has_discount());
}

#[test]
fn editing_amount_recomputes_percentage() {
    let base = cascade(d("30.00"), Decimal::ZERO, Decimal::ZERO);
    let f = apply_discount_change(&base, DiscountChange::Amount(d("2.69")));
    assert_eq!(f.discount_percentage, d("10.00"));
    assert_eq!(f.price_after_discount, d("24.22"));

    let f = apply_discount_change(&base, DiscountChange::Percentage(d("10")));
    assert_eq!(f.discount, d("2.69"));
}

#[test]
fn reprice_keeps_the_chosen_half() {
    let current = cascade(d("30.00"), Decimal::ZERO, d("20"));
    assert!(needs_anchor(&current, d("40")));

    let by_pct = reprice(&current, Some(d("40")), DiscountAnchor::Percentage);
    assert_eq!(by_pct.product_price, d("35.87"));
    assert_eq!(by_pct.discount_percentage, d("20"));
    assert_eq!(by_pct.discount, d("7.17"));
    assert_eq!(by_pct.price_after_discount, d("28.70"));
    assert_eq!(by_pct.price_after_ivu_and_discount, d("32.00"));

    let by_amount = reprice(&current, Some(d("40")), DiscountAnchor::Amount);
    assert_eq!(by_amount.discount, current.discount);
    assert_eq!(
        by_amount.discount,
        recalc_from_percentage(by_amount.product_price, by_amount.discount_percentage)
    );
}

#[test]
fn blank_price_wipes_the_group() {
    let current = cascade(d("30.00"), Decimal::ZERO, d("20"));
    assert_eq!(reprice(&current, None, DiscountAnchor::Amount), PriceFields::zeroed());
    assert_eq!(
        reprice(&current, Some(Decimal::ZERO), DiscountAnchor::Percentage),
        PriceFields::zeroed()
    );
}

#[test]
fn no_anchor_needed_without_discount() {
    let current = cascade(d("30.00"), Decimal::ZERO, Decimal::ZERO);
    assert!(!needs_anchor(&current, d("45.00")));
}

#[test]
fn oversized_discount_inputs_do_not_overflow() {
    assert_eq!(recalc_from_amount(d("0.0000000000000000000000000001"), Decimal::MAX), Decimal::ZERO);
    assert_eq!(recalc_from_percentage(Decimal::MAX, Decimal::MAX), Decimal::ZERO);

    let f = cascade(Decimal::MAX, Decimal::ZERO, Decimal::MAX);
    assert_eq!(f, cascade(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));

    let f = cascade(d("30"), Decimal::ZERO, d("79228162514264337593543950335"));
    assert_eq!(f.discount, Decimal::ZERO);
    assert_eq!(f.price_after_ivu_and_discount, d("30.00"));
}
