// Validation utilities
// Author: Gabriel Demetrios Lafis

use crate::data::Schema;

/// Names of the required columns absent from the schema, in the order given
pub fn missing_columns(schema: &Schema, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !schema.contains(name))
        .map(|name| name.to_string())
        .collect()
}

/// Validate that a column exists in the schema
pub fn validate_column(schema: &Schema, name: &str) -> Result<usize, String> {
    schema
        .index_of(name)
        .ok_or_else(|| format!("Column '{}' not found", name))
}
