use rust_decimal::Decimal;
use std::str::FromStr;
use stockroom_core::{parse_money, quote, quote_str, round_cents, MONEY_LIMIT, TAX_RATE};

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn quote_matches_existing_sheet_values() {
    let q = quote(d("25"));
    assert_eq!(q.regular_product_price, d("26.91"));
    assert_eq!(q.ivu_tax, d("3.09"));
    assert_eq!(q.total_price, d("30.00"));
    assert_eq!(q.price_discount, d("2.69"));

    let q = quote(d("100"));
    assert_eq!(q.regular_product_price, d("103.14"));
    assert_eq!(q.ivu_tax, d("11.86"));
    assert_eq!(q.total_price, d("115.00"));
    assert_eq!(q.price_discount, d("10.31"));
}

#[test]
fn list_price_rounds_up_to_next_five() {
    // 13.37 / 0.885 = 15.11 -> 20
    let q = quote(d("13.37"));
    assert_eq!(q.regular_product_price, d("17.94"));
    assert_eq!(q.total_price, d("20.00"));

    // already a multiple of five stays put
    let q = quote(d("44.25"));
    assert_eq!(q.total_price, d("50.00"));
}

#[test]
fn total_is_price_plus_tax_and_near_a_multiple_of_five() {
    let five = Decimal::from(5);
    for cents in (0..60_000i64).step_by(37) {
        let fmv = Decimal::new(cents, 2);
        let q = quote(fmv);
        assert_eq!(q.total_price, q.regular_product_price + q.ivu_tax);
        assert_eq!(q.ivu_tax, round_cents(q.regular_product_price * TAX_RATE));

        let nearest = (q.total_price / five).round() * five;
        assert!((q.total_price - nearest).abs() <= d("0.01"), "fmv {fmv} gave {}", q.total_price);
        assert!(nearest >= round_cents(fmv / (Decimal::ONE - TAX_RATE)));
    }
}

#[test]
fn malformed_fair_market_value_prices_as_zero() {
    let q = quote_str("not a number");
    assert_eq!(q.regular_product_price, Decimal::ZERO);
    assert_eq!(q.total_price, Decimal::ZERO);
    assert_eq!(q, quote_str(""));
    assert_eq!(quote(d("-4")), quote(Decimal::ZERO));
}

#[test]
fn money_parser_strips_symbols() {
    assert_eq!(parse_money("$1,234.50"), d("1234.50"));
    assert_eq!(parse_money(" 12.5% "), d("12.5"));
    assert_eq!(parse_money("$"), Decimal::ZERO);
    assert_eq!(parse_money("12.3.4"), Decimal::ZERO);
}

#[test]
fn huge_fair_market_value_prices_as_zero() {
    assert_eq!(quote_str("79228162514264337593543950335"), quote(Decimal::ZERO));
    assert_eq!(quote(Decimal::MAX), quote(Decimal::ZERO));
    assert_eq!(parse_money("1e40"), Decimal::ZERO);
    assert_eq!(parse_money("-99999999999"), Decimal::ZERO);

    assert_eq!(parse_money("1,000,000,000"), MONEY_LIMIT);
    assert!(quote(MONEY_LIMIT).total_price > MONEY_LIMIT);
}
