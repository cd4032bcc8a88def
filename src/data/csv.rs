// CSV data source implementation
// Author: Gabriel Demetrios Lafis

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use super::{DataError, DataSet, DataSource, DataType, Field, Row, Schema, Value};

/// CSV data source. Every cell is read as text; empty cells become `Null`.
pub struct CsvSource {
    path: String,
    delimiter: u8,
}

impl CsvSource {
    /// Create a new CSV data source
    pub fn new<P: AsRef<Path>>(path: P, delimiter: u8) -> Self {
        CsvSource {
            path: path.as_ref().to_string_lossy().to_string(),
            delimiter,
        }
    }

    fn open(&self) -> Result<File, DataError> {
        File::open(&self.path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => DataError::SourceNotFound(self.path.clone()),
            _ => DataError::IoError(err),
        })
    }
}

impl DataSource for CsvSource {
    fn read(&self) -> Result<DataSet, DataError> {
        let reader = BufReader::new(self.open()?);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| DataError::ParseError(e.to_string()))?
            .iter()
            .map(|s| s.trim_start_matches('\u{feff}').to_string())
            .collect();

        let fields: Vec<Field> = headers
            .iter()
            .map(|name| Field::new(name.clone(), DataType::String, true))
            .collect();

        let mut dataset = DataSet::new(Schema::new(fields));

        for result in csv_reader.records() {
            let record = result.map_err(|e| DataError::ParseError(e.to_string()))?;

            let values: Vec<Value> = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Value::Null
                    } else {
                        Value::String(field.to_string())
                    }
                })
                .collect();

            dataset.add_row(Row::new(values))?;
        }

        dataset.metadata.add("source".to_string(), "csv".to_string());
        dataset.metadata.add("path".to_string(), self.path.clone());

        Ok(dataset)
    }

    fn name(&self) -> &str {
        &self.path
    }
}
