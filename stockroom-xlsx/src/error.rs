use stockroom_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("cannot open workbook: {0}")]
    Open(String),
    #[error("sheet '{0}' not found")]
    MissingSheet(String),
    #[error("column '{0}' not found in the header row")]
    MissingColumn(String),
    #[error("no row with Product ID {0}")]
    MissingRow(String),
    #[error("xlsx write failed: {0}")]
    Write(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for SheetError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        SheetError::Write(e.to_string())
    }
}
