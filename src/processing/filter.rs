// Filter operations for bid tables
// Author: Gabriel Demetrios Lafis

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::{DataSet, Value};
use crate::utils::validate_column;
use super::{DataProcessor, ProcessingError, ProcessorType};

type Comparator = fn(f64, f64) -> bool;

fn greater_than(a: f64, b: f64) -> bool {
    a > b
}

fn less_than(a: f64, b: f64) -> bool {
    a < b
}

// Exact, no epsilon
#[allow(clippy::float_cmp)]
fn equal(a: f64, b: f64) -> bool {
    a == b
}

fn less_or_equal(a: f64, b: f64) -> bool {
    a <= b
}

fn greater_or_equal(a: f64, b: f64) -> bool {
    a >= b
}

const COMPARATORS: [(ComparisonOperator, Comparator); 5] = [
    (ComparisonOperator::GreaterThan, greater_than),
    (ComparisonOperator::LessThan, less_than),
    (ComparisonOperator::Equal, equal),
    (ComparisonOperator::LessOrEqual, less_or_equal),
    (ComparisonOperator::GreaterOrEqual, greater_or_equal),
];

/// Comparison applied between a cell and a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    Equal,
    LessOrEqual,
    GreaterOrEqual,
    /// Keeps every row
    None,
}

impl ComparisonOperator {
    /// The comparison function, or `None` for the no-op operator
    pub fn comparator(self) -> Option<Comparator> {
        COMPARATORS
            .iter()
            .find(|(op, _)| *op == self)
            .map(|(_, cmp)| *cmp)
    }

    /// Symbol shown to users
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::None => "none",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ComparisonOperator {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            ">" | "gt" | "greater_than" => Ok(ComparisonOperator::GreaterThan),
            "<" | "lt" | "less_than" => Ok(ComparisonOperator::LessThan),
            "=" | "==" | "eq" | "equal" => Ok(ComparisonOperator::Equal),
            "<=" | "le" | "less_or_equal" => Ok(ComparisonOperator::LessOrEqual),
            ">=" | "ge" | "greater_or_equal" => Ok(ComparisonOperator::GreaterOrEqual),
            "" | "none" => Ok(ComparisonOperator::None),
            other => Err(ProcessingError::InvalidArgument(format!(
                "Unknown comparison operator: {}", other
            ))),
        }
    }
}

/// A single column/operator/threshold condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub column: String,
    pub operator: ComparisonOperator,
    pub value: f64,
}

impl FilterPredicate {
    /// Create a new predicate
    pub fn new(column: &str, operator: ComparisonOperator, value: f64) -> Self {
        FilterPredicate {
            column: column.to_string(),
            operator,
            value,
        }
    }

    /// Check whether a cell satisfies the predicate. Cells without a numeric
    /// value only pass the no-op operator.
    pub fn matches(&self, cell: &Value) -> bool {
        match self.operator.comparator() {
            None => true,
            Some(cmp) => cell.as_f64().map_or(false, |v| cmp(v, self.value)),
        }
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.value)
    }
}

/// Parses `column:operator:value`, e.g. `prazo rest:<=:25`
impl FromStr for FilterPredicate {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (value, operator, column) = match (parts.next(), parts.next(), parts.next()) {
            (Some(value), Some(operator), Some(column)) if !column.is_empty() => (value, operator, column),
            _ => {
                return Err(ProcessingError::InvalidArgument(format!(
                    "Expected column:operator:value, got '{}'", s
                )))
            }
        };

        let value = value.trim().replace(',', ".").parse::<f64>().map_err(|_| {
            ProcessingError::InvalidArgument(format!("Invalid threshold '{}'", value))
        })?;

        Ok(FilterPredicate::new(column, operator.parse()?, value))
    }
}

/// Keeps rows satisfying every predicate
pub struct FilterProcessor {
    name: String,
    predicates: Vec<FilterPredicate>,
}

impl FilterProcessor {
    /// Create a filter combining the predicates with logical AND
    pub fn new(predicates: Vec<FilterPredicate>) -> Self {
        let name = if predicates.is_empty() {
            "filter".to_string()
        } else {
            let parts: Vec<String> = predicates.iter().map(|p| p.to_string()).collect();
            format!("filter[{}]", parts.join(" and "))
        };
        FilterProcessor { name, predicates }
    }

    /// Create a filter from a single predicate
    pub fn single(column: &str, operator: ComparisonOperator, value: f64) -> Self {
        Self::new(vec![FilterPredicate::new(column, operator, value)])
    }
}

impl DataProcessor for FilterProcessor {
    fn process(&self, input: &DataSet) -> Result<DataSet, ProcessingError> {
        // Resolve columns first so an unknown name fails even on empty input
        let resolved = self
            .predicates
            .iter()
            .map(|p| {
                validate_column(&input.schema, &p.column)
                    .map(|index| (index, p))
                    .map_err(ProcessingError::InvalidArgument)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = input.empty_like();

        for row in &input.data {
            if resolved.iter().all(|(i, p)| p.matches(&row.values[*i])) {
                result.add_row(row.clone())?;
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Filter
    }
}

/// Apply the predicates to a table, keeping the original row order
pub fn apply_filters(input: &DataSet, predicates: &[FilterPredicate]) -> Result<DataSet, ProcessingError> {
    FilterProcessor::new(predicates.to_vec()).process(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, Field, Row, Schema};

    fn dataset() -> DataSet {
        let mut dataset = DataSet::new(Schema::new(vec![
            Field::new("grupo".to_string(), DataType::String, true),
            Field::new("lance máx".to_string(), DataType::Float, false),
            Field::new("prazo rest".to_string(), DataType::Integer, false),
        ]));
        for (grupo, lance, prazo) in [("A", 20.0, 30), ("B", 50.0, 10), ("C", 27.0, 25)] {
            dataset
                .add_row(Row::new(vec![
                    Value::String(grupo.to_string()),
                    Value::Float(lance),
                    Value::Integer(prazo),
                ]))
                .unwrap();
        }
        dataset
    }

    fn groups(dataset: &DataSet) -> Vec<String> {
        dataset.data.iter().map(|row| row.values[0].to_string()).collect()
    }

    #[test]
    fn each_operator() {
        let data = dataset();
        let cases = [
            (ComparisonOperator::GreaterThan, vec!["A"]),
            (ComparisonOperator::LessThan, vec!["B"]),
            (ComparisonOperator::Equal, vec!["C"]),
            (ComparisonOperator::LessOrEqual, vec!["B", "C"]),
            (ComparisonOperator::GreaterOrEqual, vec!["A", "C"]),
            (ComparisonOperator::None, vec!["A", "B", "C"]),
        ];
        for (operator, expected) in cases {
            let result = apply_filters(&data, &[FilterPredicate::new("prazo rest", operator, 25.0)]).unwrap();
            assert_eq!(groups(&result), expected, "operator {}", operator);
        }
    }

    #[test]
    fn predicates_are_combined_with_and() {
        let result = apply_filters(
            &dataset(),
            &[
                FilterPredicate::new("prazo rest", ComparisonOperator::LessOrEqual, 25.0),
                FilterPredicate::new("lance máx", ComparisonOperator::LessThan, 30.0),
            ],
        )
        .unwrap();
        assert_eq!(groups(&result), vec!["C"]);
    }

    #[test]
    fn equality_has_no_tolerance() {
        let result = apply_filters(
            &dataset(),
            &[FilterPredicate::new("lance máx", ComparisonOperator::Equal, 27.000000000001)],
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let predicates = [FilterPredicate::new("lance máx", ComparisonOperator::GreaterOrEqual, 27.0)];
        let once = apply_filters(&dataset(), &predicates).unwrap();
        let twice = apply_filters(&once, &predicates).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn non_numeric_cells_never_match() {
        let result = apply_filters(
            &dataset(),
            &[FilterPredicate::new("grupo", ComparisonOperator::GreaterThan, 0.0)],
        )
        .unwrap();
        assert!(result.is_empty());

        let untouched = apply_filters(&dataset(), &[FilterPredicate::new("grupo", ComparisonOperator::None, 0.0)]).unwrap();
        assert_eq!(untouched.len(), 3);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let result = apply_filters(
            &dataset().empty_like(),
            &[FilterPredicate::new("valor", ComparisonOperator::Equal, 1.0)],
        );
        assert!(matches!(result, Err(ProcessingError::InvalidArgument(_))));
    }

    #[test]
    fn parses_operators_and_predicates() {
        assert_eq!(">=".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::GreaterOrEqual);
        assert_eq!("less_than".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::LessThan);
        assert!("~".parse::<ComparisonOperator>().is_err());

        let predicate: FilterPredicate = "lance máx:>=:27,5".parse().unwrap();
        assert_eq!(predicate, FilterPredicate::new("lance máx", ComparisonOperator::GreaterOrEqual, 27.5));
        assert!("lance máx:>=".parse::<FilterPredicate>().is_err());
        assert!("prazo rest:<:abc".parse::<FilterPredicate>().is_err());
    }

    #[test]
    fn operator_serde_names() {
        let json = serde_json::to_string(&ComparisonOperator::LessOrEqual).unwrap();
        assert_eq!(json, "\"less_or_equal\"");
        let predicate: FilterPredicate =
            serde_json::from_str(r#"{"column": "prazo rest", "operator": "none", "value": 0}"#).unwrap();
        assert_eq!(predicate.operator, ComparisonOperator::None);
    }
}
