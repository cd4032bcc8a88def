// Storage module for loaded datasets
// Author: Gabriel Demetrios Lafis

mod cache;

pub use cache::*;

use std::error::Error;
use std::fmt;

use crate::data::DataError;

/// Represents an error in the storage module
#[derive(Debug)]
pub enum StorageError {
    DataError(DataError),
    IoError(std::io::Error),
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::DataError(err) => write!(f, "Data error: {}", err),
            StorageError::IoError(err) => write!(f, "IO error: {}", err),
            StorageError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl Error for StorageError {}

impl From<DataError> for StorageError {
    fn from(err: DataError) -> Self {
        StorageError::DataError(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}
