// Sort operations for bid tables
// Author: Gabriel Demetrios Lafis

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::data::DataSet;
use crate::utils::validate_column;
use super::{DataProcessor, ProcessingError, ProcessorType};

fn default_ascending() -> bool {
    true
}

/// Ordered sort keys sharing one direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            columns: Vec::new(),
            ascending: true,
        }
    }
}

impl SortSpec {
    /// Create a sort spec; the first column is the primary key
    pub fn new(columns: Vec<String>, ascending: bool) -> Self {
        SortSpec { columns, ascending }
    }

    /// Sort spec that leaves row order alone
    pub fn unsorted() -> Self {
        Self::default()
    }
}

/// Stable multi-key sort
pub struct SortProcessor {
    spec: SortSpec,
}

impl SortProcessor {
    /// Create a new sort processor
    pub fn new(spec: SortSpec) -> Self {
        SortProcessor { spec }
    }
}

impl DataProcessor for SortProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        let keys = self
            .spec
            .columns
            .iter()
            .map(|column| validate_column(&input.schema, column).map_err(ProcessingError::InvalidArgument))
            .collect::<Result<Vec<usize>, _>>()?;

        let mut result = input.clone();
        if keys.is_empty() {
            return Ok(result);
        }

        // sort_by is stable, so ties keep their input order in both directions
        result.data.sort_by(|a, b| {
            for &i in &keys {
                let cmp = a.values[i].sort_cmp(&b.values[i]);
                if cmp != Ordering::Equal {
                    // missing values stay last in both directions
                    let missing = a.values[i].is_missing() || b.values[i].is_missing();
                    return if self.spec.ascending || missing { cmp } else { cmp.reverse() };
                }
            }
            Ordering::Equal
        });

        Ok(result)
    }

    fn name(&self) -> &str {
        "sort"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Sort
    }
}

/// Order a table by the listed columns, all in one direction
pub fn apply_sort(input: &DataSet, spec: &SortSpec) -> Result<DataSet, ProcessingError> {
    SortProcessor::new(spec.clone()).process(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, Field, Row, Schema, Value};

    fn dataset(rows: &[(&str, Value, Value)]) -> DataSet {
        let mut dataset = DataSet::new(Schema::new(vec![
            Field::new("grupo".to_string(), DataType::String, true),
            Field::new("lance máx".to_string(), DataType::Float, true),
            Field::new("prazo rest".to_string(), DataType::Integer, true),
        ]));
        for (grupo, lance, prazo) in rows {
            dataset
                .add_row(Row::new(vec![Value::String(grupo.to_string()), lance.clone(), prazo.clone()]))
                .unwrap();
        }
        dataset
    }

    fn groups(dataset: &DataSet) -> Vec<String> {
        dataset.data.iter().map(|row| row.values[0].to_string()).collect()
    }

    fn sample() -> DataSet {
        dataset(&[
            ("A", Value::Float(20.0), Value::Integer(30)),
            ("B", Value::Float(50.0), Value::Integer(10)),
            ("C", Value::Float(20.0), Value::Integer(10)),
            ("D", Value::Float(35.0), Value::Integer(30)),
        ])
    }

    #[test]
    fn empty_keys_keep_order() {
        let data = sample();
        assert_eq!(apply_sort(&data, &SortSpec::unsorted()).unwrap(), data);
        assert_eq!(apply_sort(&data, &SortSpec::new(vec![], false)).unwrap(), data);
    }

    #[test]
    fn single_key_is_stable_in_both_directions() {
        let spec = SortSpec::new(vec!["prazo rest".to_string()], true);
        assert_eq!(groups(&apply_sort(&sample(), &spec).unwrap()), vec!["B", "C", "A", "D"]);

        let spec = SortSpec::new(vec!["prazo rest".to_string()], false);
        assert_eq!(groups(&apply_sort(&sample(), &spec).unwrap()), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn keys_in_priority_order_share_direction() {
        let spec = SortSpec::new(vec!["prazo rest".to_string(), "lance máx".to_string()], true);
        assert_eq!(groups(&apply_sort(&sample(), &spec).unwrap()), vec!["C", "B", "A", "D"]);

        let spec = SortSpec::new(vec!["prazo rest".to_string(), "lance máx".to_string()], false);
        assert_eq!(groups(&apply_sort(&sample(), &spec).unwrap()), vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn nulls_sort_last_either_way() {
        let data = dataset(&[
            ("A", Value::Null, Value::Integer(1)),
            ("B", Value::Float(2.0), Value::Integer(1)),
            ("C", Value::Float(1.0), Value::Integer(1)),
        ]);

        let asc = SortSpec::new(vec!["lance máx".to_string()], true);
        assert_eq!(groups(&apply_sort(&data, &asc).unwrap()), vec!["C", "B", "A"]);

        let desc = SortSpec::new(vec!["lance máx".to_string()], false);
        assert_eq!(groups(&apply_sort(&data, &desc).unwrap()), vec!["B", "C", "A"]);
    }

    #[test]
    fn nan_sorts_last_either_way() {
        let data = dataset(&[
            ("A", Value::Float(f64::NAN), Value::Integer(1)),
            ("B", Value::Float(20.0), Value::Integer(2)),
            ("C", Value::Float(30.0), Value::Integer(3)),
            ("D", Value::Null, Value::Integer(4)),
        ]);

        let desc = SortSpec::new(vec!["lance máx".to_string()], false);
        assert_eq!(groups(&apply_sort(&data, &desc).unwrap()), vec!["C", "B", "A", "D"]);

        let asc = SortSpec::new(vec!["lance máx".to_string()], true);
        assert_eq!(groups(&apply_sort(&data, &asc).unwrap()), vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn input_is_not_mutated() {
        let data = sample();
        let before = data.clone();
        let _ = apply_sort(&data, &SortSpec::new(vec!["lance máx".to_string()], true)).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let spec = SortSpec::new(vec!["valor".to_string()], true);
        assert!(matches!(apply_sort(&sample(), &spec), Err(ProcessingError::InvalidArgument(_))));
    }

    #[test]
    fn ascending_defaults_to_true() {
        let spec: SortSpec = serde_json::from_str(r#"{"columns": ["prazo rest"]}"#).unwrap();
        assert!(spec.ascending);
    }
}
