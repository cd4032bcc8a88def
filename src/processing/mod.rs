// Processing module for filtering and ordering bid tables
// Author: Gabriel Demetrios Lafis

mod filter;
mod sort;
mod view;

pub use filter::*;
pub use sort::*;
pub use view::*;

use std::error::Error;
use std::fmt;

use log::debug;

use crate::data::{DataError, DataSet};

/// Represents a data processor that transforms data
pub trait DataProcessor {
    /// Process a dataset and return a new dataset
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError>;

    /// Get the processor name
    fn name(&self) -> &str;

    /// Get the processor type
    fn processor_type(&self) -> ProcessorType;
}

/// Represents a processor type
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorType {
    Filter,
    Sort,
    Custom(String),
}

/// Represents an error in the processing module
#[derive(Debug)]
pub enum ProcessingError {
    DataError(DataError),
    InvalidArgument(String),
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcessingError::DataError(err) => write!(f, "Data error: {}", err),
            ProcessingError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl Error for ProcessingError {}

impl From<DataError> for ProcessingError {
    fn from(err: DataError) -> Self {
        ProcessingError::DataError(err)
    }
}

/// Pipeline for chaining multiple processors
pub struct Pipeline {
    name: String,
    processors: Vec<Box<dyn DataProcessor + Send + Sync>>,
}

impl Pipeline {
    /// Create a new pipeline with the given name
    pub fn new(name: &str) -> Self {
        Pipeline {
            name: name.to_string(),
            processors: Vec::new(),
        }
    }

    /// Add a processor to the pipeline
    pub fn add<P: DataProcessor + Send + Sync + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Number of stages in the pipeline
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Check if the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Execute the pipeline on a dataset
    pub fn execute(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        let mut current = input.clone();

        for processor in &self.processors {
            current = processor.process(&current)?;
            debug!("{}: {} left {} rows", self.name, processor.name(), current.len());
        }

        Ok(current)
    }
}

impl DataProcessor for Pipeline {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        self.execute(input)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Custom("Pipeline".to_string())
    }
}
