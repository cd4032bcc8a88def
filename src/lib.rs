// Lance Analyzer
// Author: Gabriel Demetrios Lafis

//! # Lance Analyzer
//!
//! Loads a table of bids, filters it on the maximum bid percentage
//! (`lance máx`) and the remaining term (`prazo rest`), sorts it and exports
//! the result as an Excel workbook.
//!
//! ## Features
//!
//! - CSV loading with normalization of the two numeric columns
//! - Comparison filters combined with logical AND
//! - Stable multi-column sorting with a shared direction
//! - In-memory `.xlsx` export and the matching decoder
//! - Load cache keyed on the source file's modification time and size
//! - REST API and command line interface
//!
//! ## Example
//!
//! ```rust
//! use lance_analyzer::{
//!     data::{DataSet, DataType, Field, Row, Schema, Value, XlsxEncoder, MAX_BID_PERCENT, REMAINING_TERM},
//!     processing::{apply_filters, apply_sort, ComparisonOperator, FilterPredicate, SortSpec},
//! };
//!
//! let mut dataset = DataSet::new(Schema::new(vec![
//!     Field::new(MAX_BID_PERCENT.to_string(), DataType::Float, false),
//!     Field::new(REMAINING_TERM.to_string(), DataType::Integer, false),
//! ]));
//! dataset.add_row(Row::new(vec![Value::Float(20.0), Value::Integer(30)])).unwrap();
//! dataset.add_row(Row::new(vec![Value::Float(50.0), Value::Integer(10)])).unwrap();
//!
//! // Keep bids above 30%
//! let filtered = apply_filters(
//!     &dataset,
//!     &[FilterPredicate::new(MAX_BID_PERCENT, ComparisonOperator::GreaterThan, 30.0)],
//! ).unwrap();
//! assert_eq!(filtered.len(), 1);
//!
//! // Order by remaining term
//! let sorted = apply_sort(&dataset, &SortSpec::new(vec![REMAINING_TERM.to_string()], true)).unwrap();
//! assert_eq!(sorted.data[0].values[1], Value::Integer(10));
//!
//! // Encode for download
//! let bytes = XlsxEncoder::default().encode(&sorted).unwrap();
//! assert!(!bytes.is_empty());
//! ```

pub mod data;
pub mod processing;
pub mod storage;
pub mod api;
pub mod utils;

// Re-export main types
pub use data::{DataSet, DataType, DatasetLoader, Field, LoadReport, Row, Schema, Value};
pub use processing::{Pipeline, View, ViewRequest};
pub use storage::LoadCache;
pub use api::Server;
pub use utils::Config;
