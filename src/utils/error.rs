// Error handling utilities
// Author: Gabriel Demetrios Lafis

use std::error::Error;
use std::fmt;

use crate::data::{DataError, XlsxError};
use crate::processing::ProcessingError;

/// Errors raised by a command line run
#[derive(Debug)]
pub enum AppError {
    Data(DataError),
    Processing(ProcessingError),
    Spreadsheet(XlsxError),
    Config(String),
    MissingColumns {
        source: String,
        columns: Vec<String>,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Data(err) => write!(f, "Data error: {}", err),
            AppError::Processing(err) => write!(f, "Processing error: {}", err),
            AppError::Spreadsheet(err) => write!(f, "Spreadsheet error: {}", err),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::MissingColumns { source, columns } => {
                write!(f, "'{}' is missing column(s): {}", source, columns.join(", "))
            }
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Data(err) => Some(err),
            AppError::Processing(err) => Some(err),
            AppError::Spreadsheet(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::Data(err)
    }
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        AppError::Processing(err)
    }
}

impl From<XlsxError> for AppError {
    fn from(err: XlsxError) -> Self {
        AppError::Spreadsheet(err)
    }
}

/// Result type alias for AppError
pub type AppResult<T> = Result<T, AppError>;
