use std::fs;
use std::io::Write;
use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use stockroom_core::columns::PRODUCT_ID;
use stockroom_core::{CellValue, DATE_FORMAT};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use umya_spreadsheet::{reader, writer, Worksheet};

use crate::{RowUpdate, SheetError};

/// 1-based column of every non-blank header in row 1.
fn header_columns(ws: &Worksheet) -> Vec<(String, u32)> {
    (1..=ws.get_highest_column())
        .map(|col| (ws.get_value((col, 1)).trim().to_string(), col))
        .filter(|(h, _)| !h.is_empty())
        .collect()
}

fn find_row(ws: &Worksheet, id_col: u32, product_id: &str) -> Option<u32> {
    let id = product_id.trim().to_uppercase();
    (2..=ws.get_highest_row()).find(|&r| ws.get_value((id_col, r)).trim().to_uppercase() == id)
}

/// Dates are stored as `MM/DD/YYYY` text, the layout the sheet's date columns use.
fn set_cell(ws: &mut Worksheet, col: u32, row: u32, value: &CellValue) {
    let cell = ws.get_cell_mut((col, row));
    match value {
        CellValue::Empty => {
            cell.set_value_string("");
        }
        CellValue::Number(n) => {
            cell.set_value_number(n.to_f64().unwrap_or_default());
        }
        CellValue::Text(t) => {
            cell.set_value_string(t.clone());
        }
        CellValue::Date(d) => {
            cell.set_value_string(d.format(DATE_FORMAT).to_string());
        }
    }
}

/// Writes `updates` into the existing workbook at `path`, touching only the
/// listed cells. Everything else in the file (other sheets, formulas,
/// styles, images, columns without a header) is kept. Headers missing from
/// the sheet are skipped. Returns the number of rows updated.
pub fn save_row_updates(
    path: &Path,
    sheet_name: &str,
    updates: &[RowUpdate],
) -> Result<usize, SheetError> {
    if updates.is_empty() {
        return Ok(0);
    }
    let mut book = reader::xlsx::read(path)
        .map_err(|e| SheetError::Open(format!("{}: {}", path.display(), e)))?;
    let ws = book
        .get_sheet_collection_mut()
        .iter_mut()
        .find(|ws| ws.get_name() == sheet_name)
        .ok_or_else(|| SheetError::MissingSheet(sheet_name.to_string()))?;

    let headers = header_columns(ws);
    let column_of = |header: &str| headers.iter().find(|(h, _)| h == header).map(|(_, c)| *c);
    let id_col = column_of(PRODUCT_ID).ok_or_else(|| SheetError::MissingColumn(PRODUCT_ID.to_string()))?;

    let mut updated = 0;
    for update in updates {
        let Some(row) = find_row(ws, id_col, &update.product_id) else {
            warn!(product_id = %update.product_id, "row not found, update skipped");
            continue;
        };
        for (header, value) in &update.cells {
            match column_of(header) {
                Some(col) => set_cell(ws, col, row, value),
                None => debug!(%header, "column not in sheet, value not saved"),
            }
        }
        updated += 1;
    }

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    writer::xlsx::write_writer(&book, tmp.as_file_mut())
        .map_err(|e| SheetError::Write(e.to_string()))?;
    tmp.as_file_mut().flush()?;
    tmp.persist(path).map_err(|e| SheetError::Io(e.error))?;
    info!(path = %path.display(), sheet = sheet_name, rows = updated, "workbook saved");
    Ok(updated)
}

pub(crate) fn persist_bytes(bytes: &[u8], path: &Path) -> Result<(), SheetError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| SheetError::Io(e.error))?;
    Ok(())
}
