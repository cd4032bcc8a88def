// API module for exposing the view pipeline via HTTP
// Author: Gabriel Demetrios Lafis

mod server;
mod routes;
mod handlers;
mod models;

pub use server::*;
pub use routes::*;
pub use handlers::*;
pub use models::*;

use std::error::Error;
use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::data::DataError;
use crate::processing::ProcessingError;
use crate::storage::StorageError;

/// Represents an error in the API module
#[derive(Debug)]
pub enum ApiError {
    DataError(DataError),
    ProcessingError(ProcessingError),
    StorageError(StorageError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::DataError(err) => write!(f, "Data error: {}", err),
            ApiError::ProcessingError(err) => write!(f, "Processing error: {}", err),
            ApiError::StorageError(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl Error for ApiError {}

fn data_status(err: &DataError) -> StatusCode {
    match err {
        DataError::SourceNotFound(_) => StatusCode::NOT_FOUND,
        DataError::ValueParse { .. } | DataError::ParseError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DataError(err)
            | ApiError::StorageError(StorageError::DataError(err))
            | ApiError::ProcessingError(ProcessingError::DataError(err)) => data_status(err),
            ApiError::ProcessingError(ProcessingError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
        }))
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        ApiError::DataError(err)
    }
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        ApiError::ProcessingError(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::StorageError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let missing = ApiError::from(StorageError::DataError(DataError::SourceNotFound("x.csv".to_string())));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let unparseable = ApiError::from(DataError::ValueParse {
            column: "lance máx".to_string(),
            row: 1,
            raw: "x".to_string(),
        });
        assert_eq!(unparseable.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let bad_column = ApiError::from(ProcessingError::InvalidArgument("Column 'x' not found".to_string()));
        assert_eq!(bad_column.status_code(), StatusCode::BAD_REQUEST);

        let wrapped = ApiError::from(ProcessingError::from(DataError::SourceNotFound("x.csv".to_string())));
        assert_eq!(wrapped.status_code(), StatusCode::NOT_FOUND);
    }
}
