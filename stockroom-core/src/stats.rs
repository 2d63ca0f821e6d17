use crate::{FolderCategory, ProductRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub count: u32,
    pub list_value: Decimal,
}

impl Totals {
    pub fn record(&mut self, r: &ProductRecord) {
        self.count += 1;
        match self.list_value.checked_add(r.prices.price_after_ivu) {
            Some(v) => self.list_value = v,
            None => warn!(product_id = %r.product_id, "list value total overflowed, price not added"),
        }
    }

    pub fn average(&self) -> Decimal {
        if self.count == 0 {
            Decimal::ZERO
        } else {
            crate::round_cents(self.list_value / Decimal::from(self.count))
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct InventorySummary {
    pub totals: Totals,
    pub per_category: BTreeMap<FolderCategory, Totals>,
}

pub fn summarize(records: &[ProductRecord], today: NaiveDate) -> InventorySummary {
    let mut summary = InventorySummary::default();
    for r in records {
        summary.totals.record(r);
        summary
            .per_category
            .entry(r.category(today))
            .or_default()
            .record(r);
    }
    summary
}
