use crate::SheetError;
use stockroom_core::columns::PRODUCT_ID;
use stockroom_core::{CellValue, ProductRecord, Row};
use std::collections::BTreeSet;
use tracing::warn;

/// One worksheet: the header row plus data rows keyed by header text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Position of the row whose Product ID matches, ignoring case.
    pub fn row_index(&self, product_id: &str) -> Option<usize> {
        let id = product_id.trim().to_uppercase();
        self.rows.iter().position(|r| {
            r.get(PRODUCT_ID)
                .map(|c| c.as_text().to_uppercase() == id)
                .unwrap_or(false)
        })
    }

    /// Every row that parses as a product. Rows without an ID are skipped
    /// silently; rows with unreadable dates are skipped with a warning.
    pub fn records(&self) -> Vec<ProductRecord> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.get(PRODUCT_ID).map(|c| !c.is_blank()).unwrap_or(false))
            .filter_map(|(i, r)| match ProductRecord::from_row(r) {
                Ok(rec) => Some(rec),
                Err(e) => {
                    // header is row 1
                    warn!(row = i + 2, error = %e, "skipping unreadable row");
                    None
                }
            })
            .collect()
    }

    pub fn record(&self, product_id: &str) -> Result<ProductRecord, SheetError> {
        let i = self
            .row_index(product_id)
            .ok_or_else(|| SheetError::MissingRow(product_id.to_string()))?;
        Ok(ProductRecord::from_row(&self.rows[i])?)
    }

    /// Writes `record` into its row.
    pub fn update_record(&mut self, record: &ProductRecord) -> Result<(), SheetError> {
        let i = self
            .row_index(&record.product_id)
            .ok_or_else(|| SheetError::MissingRow(record.product_id.clone()))?;
        record.apply_to_row(&mut self.rows[i]);
        Ok(())
    }

    /// Cell changes between `before` (an earlier copy of `rows`) and the
    /// current rows, one update per product row that changed.
    pub fn changes_since(&self, before: &[Row]) -> Vec<RowUpdate> {
        self.rows
            .iter()
            .zip(before)
            .filter_map(|(now, was)| {
                let product_id = now.get(PRODUCT_ID).map(CellValue::as_text)?;
                if product_id.is_empty() {
                    return None;
                }
                let cells: Vec<(String, CellValue)> = now
                    .keys()
                    .chain(was.keys())
                    .filter(|k| k.as_str() != PRODUCT_ID)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .filter_map(|k| {
                        let new = now.get(k).cloned().unwrap_or_default();
                        let old = was.get(k).cloned().unwrap_or_default();
                        (!same_cell(&old, &new)).then(|| (k.clone(), new))
                    })
                    .collect();
                (!cells.is_empty()).then_some(RowUpdate { product_id, cells })
            })
            .collect()
    }
}

/// Text compares without case, and a blank cell matches the value a blank
/// reads as (zero, `NO`). A row that only round-trips through
/// [`ProductRecord`] therefore yields no changes.
fn same_cell(old: &CellValue, new: &CellValue) -> bool {
    if old == new || old.as_text().eq_ignore_ascii_case(&new.as_text()) {
        return true;
    }
    old.is_blank()
        && match new {
            CellValue::Number(n) => n.is_zero(),
            CellValue::Text(t) => t.trim().eq_ignore_ascii_case("NO"),
            other => other.is_blank(),
        }
}

/// New values for some cells of one product row, keyed by header.
#[derive(Clone, Debug, PartialEq)]
pub struct RowUpdate {
    pub product_id: String,
    pub cells: Vec<(String, CellValue)>,
}

/// All sheets of a workbook in their original order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Result<&Sheet, SheetError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| SheetError::MissingSheet(name.to_string()))
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet, SheetError> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| SheetError::MissingSheet(name.to_string()))
    }
}
