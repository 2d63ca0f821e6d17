use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    Invalid(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(&'static str),
    #[error("target folder does not exist: {}", .0.display())]
    MissingRoot(PathBuf),
    #[error("cannot shorten folder name for {product_id} to fit under {}", .base.display())]
    PathTooLong { product_id: String, base: PathBuf },
    #[error("invalid date '{0}', expected MM/DD/YYYY")]
    Date(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
