use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{
    Color, ExcelDateTime, Format, FormatAlign, FormatPattern, Table, TableColumn, TableStyle,
    Workbook as XlsxWorkbook,
};
use stockroom_core::ToSellRow;
use tracing::info;

use crate::write::persist_bytes;
use crate::{read_workbook, SheetError};

const REPORT_HEADERS: [&str; 4] = [
    "Product ID",
    "To Sell After",
    "Product Name",
    "Product Price After IVU",
];
const NEW_PRODUCT_FILL: u32 = 0x90EE90;
const EXCEL_DATE_FORMAT: &str = "mm/dd/yyyy";

/// Product IDs listed in an earlier report and the day it was made.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreviousReport {
    pub date: Option<NaiveDate>,
    pub ids: HashSet<String>,
}

/// Product IDs in the first column of the first sheet of a report file.
pub fn read_report_ids(path: &Path) -> Result<HashSet<String>, SheetError> {
    let wb = read_workbook(path)?;
    let Some(sheet) = wb.sheets.first() else {
        return Ok(HashSet::new());
    };
    let Some(first) = sheet.headers.first() else {
        return Ok(HashSet::new());
    };
    Ok(sheet
        .rows
        .iter()
        .filter_map(|r| r.get(first))
        .map(|c| c.as_text().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Writes the products-to-sell report. IDs absent from `previous` are
/// highlighted as new arrivals.
pub fn write_to_sell_report(
    path: &Path,
    sheet_name: &str,
    rows: &[ToSellRow],
    previous: &PreviousReport,
    generated_at: NaiveDateTime,
) -> Result<(), SheetError> {
    let centered = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let new_id = centered
        .clone()
        .set_background_color(Color::RGB(NEW_PRODUCT_FILL))
        .set_pattern(FormatPattern::Solid);
    let date = centered.clone().set_num_format(EXCEL_DATE_FORMAT);
    let money = centered.clone().set_num_format("\"$\"#,##0.00");
    let wrapped = centered.clone().set_text_wrap();
    let note = wrapped
        .clone()
        .set_background_color(Color::RGB(NEW_PRODUCT_FILL))
        .set_pattern(FormatPattern::Solid);

    let mut xlsx = XlsxWorkbook::new();
    let ws = xlsx.add_worksheet();
    ws.set_name(sheet_name)?;

    for (col, h) in REPORT_HEADERS.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, *h, &centered)?;
    }

    let mut fresh = 0usize;
    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let is_new = !previous.ids.contains(&row.product_id.to_uppercase());
        fresh += usize::from(is_new);

        let id_format = if is_new { &new_id } else { &centered };
        ws.write_string_with_format(r, 0, &row.product_id, id_format)?;
        let d = row.to_sell_after;
        let dt = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
        ws.write_datetime_with_format(r, 1, &dt, &date)?;
        ws.write_string_with_format(r, 2, &row.product_name, &wrapped)?;
        ws.write_number_with_format(r, 3, row.price_after_ivu.to_f64().unwrap_or_default(), &money)?;
    }

    if !rows.is_empty() {
        let columns: Vec<TableColumn> = REPORT_HEADERS
            .iter()
            .map(|h| TableColumn::new().set_header(*h))
            .collect();
        let table = Table::new()
            .set_name("ProductsToSellTable")
            .set_style(TableStyle::Medium9)
            .set_columns(&columns);
        ws.add_table(0, 0, rows.len() as u32, (REPORT_HEADERS.len() - 1) as u16, &table)?;
    }

    for (col, width) in [(0u16, 17.0), (1, 17.0), (2, 100.0), (3, 28.5), (5, 80.0)] {
        ws.set_column_width(col, width)?;
    }

    let legend = match previous.date {
        Some(d) => format!(
            "Product IDs highlighted in green represent new products added since the \nlast report from {}.",
            d.format("%A, %B %d, %Y")
        ),
        None => "Product IDs highlighted in green represent new products added.".to_string(),
    };
    ws.write_string_with_format(1, 5, &legend, &note)?;
    ws.write_string_with_format(
        2,
        5,
        generated_at
            .format("This report was generated on %A, %B %d, %Y at %I:%M %p.")
            .to_string(),
        &note,
    )?;

    let bytes = xlsx.save_to_buffer()?;
    persist_bytes(&bytes, path)?;
    info!(path = %path.display(), rows = rows.len(), new = fresh, "to-sell report written");
    Ok(())
}
