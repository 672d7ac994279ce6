//! Errors raised while reading or writing xlsx files

use thiserror::Error;

use crate::types::ReconcileError;

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

impl From<WorkbookError> for ReconcileError {
    fn from(error: WorkbookError) -> Self {
        ReconcileError::PersistenceFailure(error.to_string())
    }
}
