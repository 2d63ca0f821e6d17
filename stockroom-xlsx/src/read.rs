use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use stockroom_core::{parse_date, CellValue, Row};
use tracing::{debug, info, warn};

use crate::{Sheet, SheetError, Workbook};

/// Reads every sheet of the workbook at `path`. The first row of each sheet
/// is its header; columns with a blank header are dropped.
pub fn read_workbook(path: &Path) -> Result<Workbook, SheetError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SheetError::Open(format!("{}: {}", path.display(), e)))?;

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| SheetError::Open(format!("{sheet_name}: {e}")))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|h| h.iter().map(|c| cell_from_data(c).as_text()).collect())
            .unwrap_or_default();

        let mut sheet = Sheet::new(sheet_name.clone(), headers.iter().filter(|h| !h.is_empty()).cloned().collect());
        for data in rows {
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(data.iter()) {
                if header.is_empty() {
                    continue;
                }
                let value = cell_from_data(cell);
                if !value.is_blank() {
                    row.insert(header.clone(), value);
                }
            }
            sheet.rows.push(row);
        }
        debug!(sheet = %sheet_name, rows = sheet.rows.len(), "sheet read");
        sheets.push(sheet);
    }

    info!(path = %path.display(), sheets = sheets.len(), "workbook loaded");
    Ok(Workbook { sheets })
}

/// Reads one named sheet.
pub fn read_sheet(path: &Path, sheet_name: &str) -> Result<Sheet, SheetError> {
    let mut wb = read_workbook(path)?;
    let i = wb
        .sheets
        .iter()
        .position(|s| s.name == sheet_name)
        .ok_or_else(|| SheetError::MissingSheet(sheet_name.to_string()))?;
    Ok(wb.sheets.swap_remove(i))
}

pub(crate) fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s.clone()),
        Data::Int(n) => CellValue::Number(Decimal::from(*n)),
        Data::Float(f) => CellValue::Number(decimal_from_f64(*f)),
        Data::Bool(b) => CellValue::from_bool(*b),
        Data::DateTime(dt) => date_from_serial(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Number(decimal_from_f64(dt.as_f64()))),
        Data::DateTimeIso(s) => parse_date(s)
            .map(CellValue::Date)
            .unwrap_or_else(|_| CellValue::from_text(s.clone())),
        Data::DurationIso(s) => CellValue::from_text(s.clone()),
        Data::Error(e) => {
            warn!(error = ?e, "cell holds an Excel error, reading as empty");
            CellValue::Empty
        }
    }
}

/// Goes through the shortest decimal text of the float so `12.3` stays `12.3`.
fn decimal_from_f64(f: f64) -> Decimal {
    Decimal::from_str(&f.to_string()).unwrap_or(Decimal::ZERO)
}

/// Excel serial day number (1900 date system) to a calendar date.
fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_dates() {
        assert_eq!(date_from_serial(45292.0), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(date_from_serial(45292.75), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(date_from_serial(0.0), None);
    }

    #[test]
    fn data_conversion() {
        assert_eq!(cell_from_data(&Data::Float(12.3)), CellValue::Number(Decimal::new(123, 1)));
        assert_eq!(cell_from_data(&Data::Int(7)), CellValue::Number(Decimal::from(7)));
        assert_eq!(cell_from_data(&Data::String("  ".into())), CellValue::Empty);
        assert_eq!(cell_from_data(&Data::Bool(true)), CellValue::Text("YES".into()));
        assert_eq!(
            cell_from_data(&Data::DateTimeIso("2024-03-05T00:00:00".into())),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }
}
