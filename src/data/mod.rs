// Data module for handling data structures and formats
// Author: Gabriel Demetrios Lafis

mod csv;
mod loader;
mod xlsx;

pub use self::csv::*;
pub use loader::*;
pub use xlsx::*;

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

/// Represents a generic data source
pub trait DataSource {
    /// Read data from the source
    fn read(&self) -> Result<DataSet, DataError>;

    /// Get the source name
    fn name(&self) -> &str;
}

/// Represents a generic data sink
pub trait DataSink {
    /// Write data to the sink
    fn write(&self, data: &DataSet) -> Result<(), DataError>;

    /// Get the sink name
    fn name(&self) -> &str;
}

/// Represents a dataset with schema and data
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    pub schema: Schema,
    pub data: Vec<Row>,
    pub metadata: Metadata,
}

impl DataSet {
    /// Create a new empty dataset
    pub fn new(schema: Schema) -> Self {
        DataSet {
            schema,
            data: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Create a dataset with no columns and no rows
    pub fn empty() -> Self {
        DataSet::new(Schema::new(Vec::new()))
    }

    /// Create a dataset sharing this dataset's schema and metadata, without rows
    pub fn empty_like(&self) -> Self {
        DataSet {
            schema: self.schema.clone(),
            data: Vec::new(),
            metadata: self.metadata.clone(),
        }
    }

    /// Add a row to the dataset
    pub fn add_row(&mut self, row: Row) -> Result<(), DataError> {
        if row.values.len() != self.schema.fields.len() {
            return Err(DataError::SchemaMismatch);
        }

        self.data.push(row);
        Ok(())
    }

    /// Get the number of rows in the dataset
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column names in schema order
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Get the values of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let index = self.schema.index_of(name)?;
        Some(self.data.iter().map(|row| &row.values[index]).collect())
    }
}

/// Represents a row in a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    /// Create a new row with the given values
    pub fn new(values: Vec<Value>) -> Self {
        Row { values }
    }
}

/// Represents a value in a row
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null or NaN; these sort after every other value
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Total order used for sorting. Missing values (null or NaN) compare
    /// greater than everything else and equal to each other, numbers compare
    /// numerically across Integer and Float.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_missing(), other.is_missing()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                // mixed kinds: numbers before booleans before strings
                _ => a.kind_rank().cmp(&b.kind_rank()),
            },
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Integer(_) | Value::Float(_) => 0,
            Value::Boolean(_) => 1,
            Value::String(_) => 2,
            Value::Null => 3,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// Represents a schema for a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema with the given fields
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    /// Get the position of a field by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check whether a column with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// Represents a field in a schema
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    /// Create a new field
    pub fn new(name: String, data_type: DataType, nullable: bool) -> Self {
        Field {
            name,
            data_type,
            nullable,
        }
    }
}

/// Represents a data type for a field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    String,
}

impl DataType {
    /// Lowercase name used in API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::String => "string",
        }
    }
}

/// Represents metadata for a dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub properties: std::collections::HashMap<String, String>,
}

impl Metadata {
    /// Create new empty metadata
    pub fn new() -> Self {
        Metadata {
            properties: std::collections::HashMap::new(),
        }
    }

    /// Add a property to the metadata
    pub fn add(&mut self, key: String, value: String) {
        self.properties.insert(key, value);
    }

    /// Get a property from the metadata
    pub fn get(&self, key: &str) -> Option<&String> {
        self.properties.get(key)
    }
}

/// Represents an error in the data module
#[derive(Debug)]
pub enum DataError {
    IoError(std::io::Error),
    SourceNotFound(String),
    ParseError(String),
    ValueParse {
        column: String,
        row: usize,
        raw: String,
    },
    SchemaMismatch,
    Spreadsheet(XlsxError),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataError::IoError(err) => write!(f, "IO error: {}", err),
            DataError::SourceNotFound(path) => write!(f, "File '{}' not found", path),
            DataError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataError::ValueParse { column, row, raw } => write!(
                f,
                "Cannot parse value '{}' in column '{}' at row {}",
                raw, column, row
            ),
            DataError::SchemaMismatch => write!(f, "Schema mismatch"),
            DataError::Spreadsheet(err) => write!(f, "Spreadsheet error: {}", err),
        }
    }
}

impl Error for DataError {}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::IoError(err)
    }
}

impl From<XlsxError> for DataError {
    fn from(err: XlsxError) -> Self {
        DataError::Spreadsheet(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_row_rejects_wrong_width() {
        let mut dataset = DataSet::new(Schema::new(vec![
            Field::new("a".to_string(), DataType::Integer, false),
        ]));

        assert!(dataset.add_row(Row::new(vec![Value::Integer(1)])).is_ok());
        assert!(matches!(
            dataset.add_row(Row::new(vec![Value::Integer(1), Value::Null])),
            Err(DataError::SchemaMismatch)
        ));
    }

    #[test]
    fn sort_cmp_puts_null_last_and_mixes_numbers() {
        assert_eq!(Value::Null.sort_cmp(&Value::Integer(1)), Ordering::Greater);
        assert_eq!(Value::Float(f64::NAN).sort_cmp(&Value::Float(1e300)), Ordering::Greater);
        assert_eq!(Value::Float(f64::NAN).sort_cmp(&Value::Null), Ordering::Equal);
        assert_eq!(Value::Integer(2).sort_cmp(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(Value::Float(3.0).sort_cmp(&Value::Integer(3)), Ordering::Equal);
        assert_eq!(
            Value::String("b".to_string()).sort_cmp(&Value::String("a".to_string())),
            Ordering::Greater
        );
    }
}
