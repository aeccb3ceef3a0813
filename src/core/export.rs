//! Bulk-import export of processed test cases
//!
//! The layout is hierarchical: one header record per test case carrying the
//! work item metadata, followed by one record per step carrying only the
//! step columns. The column order is fixed; the bulk-import tool on the
//! receiving side matches columns by position.

use csv::WriterBuilder;
use thiserror::Error;

use crate::core::upload::UploadResultRow;
use crate::entities::test_case::TestCase;

/// Export columns, in the order the bulk importer expects
pub const EXPORT_COLUMNS: [&str; 14] = [
    "ID",
    "Work Item Type",
    "Title",
    "Test Step",
    "Step Action",
    "Step Expected",
    "Custom.EditCheckName",
    "Custom.FieldName",
    "Custom.FormName",
    "Custom.TestCaseClassification",
    "Custom.TestingTier",
    "Area Path",
    "Assigned To",
    "State",
];

/// Work item type written on every header record
pub const WORK_ITEM_TYPE: &str = "Test Case";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Export buffer error: {0}")]
    Buffer(String),
}

/// Optional values applied to every exported test case
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub assigned_to: Option<String>,
}

/// Serialize test cases into the bulk-import layout
pub fn serialize(test_cases: &[TestCase]) -> Result<String, ExportError> {
    serialize_with(test_cases, &ExportOptions::default())
}

pub fn serialize_with(
    test_cases: &[TestCase],
    options: &ExportOptions,
) -> Result<String, ExportError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    wtr.write_record(EXPORT_COLUMNS)?;

    let assigned_to = options.assigned_to.as_deref().unwrap_or("");

    for case in test_cases {
        wtr.write_record([
            "",
            WORK_ITEM_TYPE,
            case.title.as_str(),
            "",
            "",
            "",
            "",
            "",
            case.form_name.as_str(),
            case.classification.as_str(),
            case.testing_tier.as_str(),
            case.area_path.as_str(),
            assigned_to,
            case.state.as_str(),
        ])?;

        for step in &case.steps {
            let number = step.step_number.to_string();
            wtr.write_record([
                "",
                "",
                "",
                number.as_str(),
                step.action.as_str(),
                step.expected.as_str(),
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
            ])?;
        }
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}

/// Serialize upload results, one record per test case under a header row
pub fn results_csv(results: &[UploadResultRow]) -> Result<String, ExportError> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());
    for row in results {
        wtr.serialize(row)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Buffer(e.to_string()))
}
