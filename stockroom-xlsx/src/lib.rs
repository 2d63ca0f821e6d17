//! Inventory workbook access: calamine for reading, umya-spreadsheet for
//! in-place cell updates, rust_xlsxwriter for the products-to-sell report.

pub mod error;
pub mod read;
pub mod report;
pub mod workbook;
pub mod write;

pub use error::SheetError;
pub use read::{read_sheet, read_workbook};
pub use report::{read_report_ids, write_to_sell_report, PreviousReport};
pub use workbook::{RowUpdate, Sheet, Workbook};
pub use write::save_row_updates;
