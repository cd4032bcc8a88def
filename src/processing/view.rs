// Filtered and ordered views over a loaded table
// Author: Gabriel Demetrios Lafis

use serde::{Deserialize, Serialize};

use crate::data::{DataError, DataSet, ExportArtifact, LoadReport, XlsxEncoder};
use super::{FilterPredicate, FilterProcessor, Pipeline, ProcessingError, SortProcessor, SortSpec};

/// Filters and sort collected from the user for one interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    #[serde(default)]
    pub filters: Vec<FilterPredicate>,
    #[serde(default)]
    pub sort: SortSpec,
}

impl ViewRequest {
    /// Create a request from predicates and a sort spec
    pub fn new(filters: Vec<FilterPredicate>, sort: SortSpec) -> Self {
        ViewRequest { filters, sort }
    }

    /// Filter stage followed by the sort stage
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new("view")
            .add(FilterProcessor::new(self.filters.clone()))
            .add(SortProcessor::new(self.sort.clone()))
    }
}

/// The table shown to the user after one interaction
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub dataset: DataSet,
    pub missing_columns: Vec<String>,
}

impl View {
    /// Run the request over a load result. A load with missing columns
    /// yields its empty table untouched.
    pub fn build(report: &LoadReport, request: &ViewRequest) -> Result<View, ProcessingError> {
        let dataset = if report.is_complete() {
            request.pipeline().execute(&report.dataset)?
        } else {
            report.dataset.clone()
        };

        Ok(View {
            dataset,
            missing_columns: report.missing_columns.clone(),
        })
    }

    /// Encode the view for download
    pub fn export(&self, encoder: &XlsxEncoder, file_name: &str) -> Result<ExportArtifact, DataError> {
        ExportArtifact::from_dataset(&self.dataset, encoder, file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataType, Field, Row, Schema, Value, DEFAULT_EXPORT_FILE_NAME, MAX_BID_PERCENT, REMAINING_TERM};
    use crate::processing::ComparisonOperator;

    fn report() -> LoadReport {
        let mut dataset = DataSet::new(Schema::new(vec![
            Field::new(MAX_BID_PERCENT.to_string(), DataType::Float, false),
            Field::new(REMAINING_TERM.to_string(), DataType::Integer, false),
        ]));
        dataset.add_row(Row::new(vec![Value::Float(20.0), Value::Integer(30)])).unwrap();
        dataset.add_row(Row::new(vec![Value::Float(50.0), Value::Integer(10)])).unwrap();
        LoadReport {
            dataset,
            missing_columns: Vec::new(),
        }
    }

    #[test]
    fn filters_then_sorts() {
        let request = ViewRequest::new(
            vec![FilterPredicate::new(MAX_BID_PERCENT, ComparisonOperator::GreaterThan, 10.0)],
            SortSpec::new(vec![REMAINING_TERM.to_string()], true),
        );
        let view = View::build(&report(), &request).unwrap();

        assert_eq!(
            view.dataset.column(REMAINING_TERM).unwrap(),
            vec![&Value::Integer(10), &Value::Integer(30)]
        );
    }

    #[test]
    fn incomplete_load_passes_through_empty() {
        let incomplete = LoadReport {
            dataset: DataSet::empty(),
            missing_columns: vec![REMAINING_TERM.to_string()],
        };
        let request = ViewRequest::new(
            vec![FilterPredicate::new(REMAINING_TERM, ComparisonOperator::Equal, 1.0)],
            SortSpec::new(vec![REMAINING_TERM.to_string()], true),
        );
        let view = View::build(&incomplete, &request).unwrap();

        assert!(view.dataset.is_empty());
        assert_eq!(view.missing_columns, vec![REMAINING_TERM.to_string()]);
    }

    #[test]
    fn empty_view_exports_without_offering_download() {
        let request = ViewRequest::new(
            vec![FilterPredicate::new(REMAINING_TERM, ComparisonOperator::GreaterThan, 100.0)],
            SortSpec::unsorted(),
        );
        let view = View::build(&report(), &request).unwrap();
        let artifact = view.export(&XlsxEncoder::default(), DEFAULT_EXPORT_FILE_NAME).unwrap();

        assert!(view.dataset.is_empty());
        assert!(!artifact.offer_download());
    }

    #[test]
    fn request_from_json() {
        let request: ViewRequest = serde_json::from_str(
            r#"{"filters": [{"column": "prazo rest", "operator": "less_or_equal", "value": 25}]}"#,
        )
        .unwrap();

        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.sort, SortSpec::unsorted());
        assert_eq!(request.pipeline().len(), 2);
    }
}
