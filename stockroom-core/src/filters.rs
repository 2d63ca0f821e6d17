use crate::{FolderIndexEntry, ProductRecord};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

/// Sort key for folder names: length of the first word, then the words
/// themselves, case-insensitively.
pub fn folder_sort_key(name: &str) -> (usize, Vec<String>) {
    let lower = name.to_lowercase();
    let words: Vec<String> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    (words.first().map(|w| w.len()).unwrap_or(0), words)
}

/// Distinct folder names in display order.
pub fn sorted_folder_names(entries: &[FolderIndexEntry]) -> Vec<String> {
    let mut names: Vec<String> = entries.iter().map(|e| e.folder.clone()).collect();
    names.sort_by_key(|n| folder_sort_key(n));
    names.dedup();
    names
}

/// Folder names containing every whitespace-separated term, ignoring case.
/// An empty query lists everything in display order.
pub fn search_folders(entries: &[FolderIndexEntry], query: &str) -> Vec<String> {
    let terms: Vec<String> = query.split_whitespace().map(|t| t.to_uppercase()).collect();
    if terms.is_empty() {
        return sorted_folder_names(entries);
    }
    let mut hits: Vec<String> = entries
        .iter()
        .filter(|e| {
            let upper = e.folder.to_uppercase();
            terms.iter().all(|t| upper.contains(t.as_str()))
        })
        .map(|e| e.folder.clone())
        .collect();
    hits.sort();
    hits.dedup();
    hits
}

pub fn find_record<'a>(records: &'a [ProductRecord], product_id: &str) -> Option<&'a ProductRecord> {
    let id = product_id.trim().to_uppercase();
    records.iter().find(|r| r.product_id == id)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToSellRow {
    pub product_id: String,
    pub to_sell_after: NaiveDate,
    pub product_name: String,
    pub price_after_ivu: Decimal,
}

/// Products ready for the to-sell report: still available, with a folder in
/// the to-sell root, and past their to-sell date. Sorted by Product ID.
pub fn to_sell_candidates(
    records: &[ProductRecord],
    ids_in_to_sell: &HashSet<String>,
    today: NaiveDate,
) -> Vec<ToSellRow> {
    let mut rows: Vec<ToSellRow> = records
        .iter()
        .filter(|r| {
            !(r.flags.damaged || r.flags.cancelled_order || r.flags.personal || r.flags.sold)
        })
        .filter(|r| ids_in_to_sell.contains(&r.product_id))
        .filter_map(|r| {
            let date = r.to_sell_after.filter(|d| *d <= today)?;
            Some(ToSellRow {
                product_id: r.product_id.clone(),
                to_sell_after: date,
                product_name: r.product_name.clone(),
                price_after_ivu: r.prices.price_after_ivu,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    rows
}
