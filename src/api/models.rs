// API request and response models
// Author: Gabriel Demetrios Lafis

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::{DataSet, Value};
use crate::processing::View;

/// Schema field definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub data_type: String,
}

/// Table returned for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub columns: Vec<SchemaField>,
    pub data: Vec<Vec<JsonValue>>,
    pub rows: usize,
    pub missing_columns: Vec<String>,
}

impl ViewResponse {
    /// Convert a view into its JSON form
    pub fn from_view(view: &View) -> Self {
        ViewResponse {
            columns: schema_fields(&view.dataset),
            data: view
                .dataset
                .data
                .iter()
                .map(|row| row.values.iter().map(value_to_json).collect())
                .collect(),
            rows: view.dataset.len(),
            missing_columns: view.missing_columns.clone(),
        }
    }
}

/// Result of a reload request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub source: String,
    pub invalidated: bool,
}

fn schema_fields(dataset: &DataSet) -> Vec<SchemaField> {
    dataset
        .schema
        .fields
        .iter()
        .map(|field| SchemaField {
            name: field.name.clone(),
            data_type: field.data_type.as_str().to_string(),
        })
        .collect()
}

/// Convert a cell to JSON; non-finite floats become null
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Integer(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::String(s) => JsonValue::String(s.clone()),
    }
}
