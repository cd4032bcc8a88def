// Dataset loader for bid tables
// Author: Gabriel Demetrios Lafis

use std::path::Path;

use log::{error, info, warn};

use crate::utils::missing_columns;
use super::{CsvSource, DataError, DataSet, DataSource, DataType, Field, Row, Schema, Value};

/// Maximum bid, as a percentage. Stored on disk as text such as `12,5%`.
pub const MAX_BID_PERCENT: &str = "lance máx";

/// Remaining term, a count of periods.
pub const REMAINING_TERM: &str = "prazo rest";

/// Columns every source file must carry.
pub const REQUIRED_COLUMNS: [&str; 2] = [MAX_BID_PERCENT, REMAINING_TERM];

/// Result of loading a source file.
///
/// When `missing_columns` is non-empty the dataset is empty (no fields, no
/// rows) so downstream stages still have something to work on.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub dataset: DataSet,
    pub missing_columns: Vec<String>,
}

impl LoadReport {
    /// True when every required column was present
    pub fn is_complete(&self) -> bool {
        self.missing_columns.is_empty()
    }
}

/// Reads a delimited file and normalizes the numeric columns
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    delimiter: u8,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        DatasetLoader { delimiter: b',' }
    }
}

impl DatasetLoader {
    /// Create a loader for files using the given delimiter
    pub fn new(delimiter: u8) -> Self {
        DatasetLoader { delimiter }
    }

    /// Field delimiter this loader parses with
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Load and normalize a source file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadReport, DataError> {
        let source = CsvSource::new(path.as_ref(), self.delimiter);
        let raw = source.read()?;
        let raw = drop_index_columns(raw);

        let missing = missing_columns(&raw.schema, &REQUIRED_COLUMNS);
        if !missing.is_empty() {
            for column in &missing {
                error!("Column '{}' not found in '{}'", column, source.name());
            }
            let mut dataset = DataSet::empty();
            dataset.metadata = raw.metadata;
            return Ok(LoadReport {
                dataset,
                missing_columns: missing,
            });
        }

        let dataset = normalize(raw)?;
        info!("Loaded {} rows from '{}'", dataset.len(), source.name());

        Ok(LoadReport {
            dataset,
            missing_columns: Vec::new(),
        })
    }
}

/// Parse a bid percentage: every `%` removed, every `,` turned into `.`.
pub fn parse_bid_percent(raw: &str) -> Option<f64> {
    raw.replace('%', "").replace(',', ".").trim().parse::<f64>().ok()
}

/// Parse a remaining term. Anything that is not a finite number becomes `0`.
pub fn parse_remaining_term(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::Integer(0),
    }
}

/// Anonymous index columns: blank headers, or the `Unnamed: N` name pandas
/// gives them when it writes a frame with its index.
fn is_index_column(name: &str) -> bool {
    let name = name.trim();
    name.is_empty()
        || name
            .strip_prefix("Unnamed: ")
            .map_or(false, |n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn drop_index_columns(raw: DataSet) -> DataSet {
    let keep: Vec<usize> = raw
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !is_index_column(&field.name))
        .map(|(i, _)| i)
        .collect();

    if keep.len() == raw.schema.fields.len() {
        return raw;
    }

    let fields = keep.iter().map(|&i| raw.schema.fields[i].clone()).collect();
    let data = raw
        .data
        .into_iter()
        .map(|row| Row::new(keep.iter().map(|&i| row.values[i].clone()).collect()))
        .collect();

    DataSet {
        schema: Schema::new(fields),
        data,
        metadata: raw.metadata,
    }
}

fn normalize(raw: DataSet) -> Result<DataSet, DataError> {
    let bid_index = raw
        .schema
        .index_of(MAX_BID_PERCENT)
        .ok_or(DataError::SchemaMismatch)?;
    let term_index = raw
        .schema
        .index_of(REMAINING_TERM)
        .ok_or(DataError::SchemaMismatch)?;

    let mut rows = Vec::with_capacity(raw.len());
    let mut coerced = 0usize;
    let mut blank_bids = 0usize;

    for (n, row) in raw.data.into_iter().enumerate() {
        let mut values = row.values;

        // a blank bid is kept as NaN, only non-empty text must parse
        let bid = match &values[bid_index] {
            Value::Null => {
                blank_bids += 1;
                f64::NAN
            }
            cell => {
                let bid_text = cell.to_string();
                parse_bid_percent(&bid_text).ok_or_else(|| DataError::ValueParse {
                    column: MAX_BID_PERCENT.to_string(),
                    row: n + 1,
                    raw: bid_text.clone(),
                })?
            }
        };
        values[bid_index] = Value::Float(bid);

        let term_text = values[term_index].to_string();
        let term = parse_remaining_term(&term_text);
        if term == Value::Integer(0) && term_text.trim() != "0" {
            coerced += 1;
        }
        values[term_index] = term;

        rows.push(Row::new(values));
    }

    if blank_bids > 0 {
        warn!("{} '{}' values were blank and were set to NaN", blank_bids, MAX_BID_PERCENT);
    }
    if coerced > 0 {
        warn!("{} '{}' values were not numeric and were set to 0", coerced, REMAINING_TERM);
    }

    // The term column stays integer unless some value carries a fraction
    let term_type = if rows.iter().all(|row| matches!(row.values[term_index], Value::Integer(_))) {
        DataType::Integer
    } else {
        for row in rows.iter_mut() {
            if let Value::Integer(i) = row.values[term_index] {
                row.values[term_index] = Value::Float(i as f64);
            }
        }
        DataType::Float
    };

    let fields = raw
        .schema
        .fields
        .into_iter()
        .enumerate()
        .map(|(i, field)| {
            if i == bid_index {
                Field::new(field.name, DataType::Float, false)
            } else if i == term_index {
                Field::new(field.name, term_type, false)
            } else {
                field
            }
        })
        .collect();

    let mut dataset = DataSet::new(Schema::new(fields));
    dataset.metadata = raw.metadata;
    for row in rows {
        dataset.add_row(row)?;
    }

    Ok(dataset)
}
