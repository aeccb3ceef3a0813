//! Loading the requirements table from CSV

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::entities::row::{
    RawRow, RawTable, COL_AREA_PATH, COL_CLASSIFICATION, COL_EDIT_CHECK_NAME, COL_FIELD_NAME,
    COL_FORM_NAME, COL_ITERATION_PATH, COL_STATE, COL_TESTING_TIER, COL_TEXT,
};

/// Errors raised while reading the input table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("Failed to read CSV headers: {0}")]
    Headers(String),
}

/// Load a table from a CSV file
pub fn load_table(path: &Path) -> Result<RawTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_table(BufReader::new(file))
}

/// Read a table from any CSV source.
///
/// Missing mandatory columns are not an error here; the builder reports them
/// so callers can still inspect statistics of a malformed table.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::Headers(e.to_string()))?
        .clone();
    let header_map = build_header_map(&headers);

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        // Header is line 1
        let row_num = row_idx + 2;
        let record = result.map_err(|e| LoadError::Parse {
            row: row_num,
            message: e.to_string(),
        })?;

        rows.push(RawRow {
            classification: get_field(&record, &header_map, COL_CLASSIFICATION),
            form_name: get_field(&record, &header_map, COL_FORM_NAME),
            text: get_field(&record, &header_map, COL_TEXT),
            field_name: get_field(&record, &header_map, COL_FIELD_NAME),
            edit_check_name: get_field(&record, &header_map, COL_EDIT_CHECK_NAME),
            testing_tier: get_field(&record, &header_map, COL_TESTING_TIER),
            area_path: get_field(&record, &header_map, COL_AREA_PATH),
            iteration_path: get_field(&record, &header_map, COL_ITERATION_PATH),
            state: get_field(&record, &header_map, COL_STATE),
        });
    }

    let headers = headers.iter().map(|h| h.trim().to_string()).collect();
    Ok(RawTable::new(headers, rows))
}

/// Build a map from lowercased header name to column index
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

/// Get a trimmed, non-empty field value from a CSV record
fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(&field.to_lowercase())
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_table_maps_columns() {
        let csv = "Custom.TestCaseClassification,Custom.FormName,Custom.FieldName,Custom.TestingTier\n\
                   Field Level,Demographics,BRTHDAT,\n\
                   Form Level, Demographics ,,Tier 2\n";
        let table = read_table(csv.as_bytes()).unwrap();

        assert_eq!(table.headers.len(), 4);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].field_name.as_deref(), Some("BRTHDAT"));
        assert_eq!(table.rows[0].testing_tier, None);
        assert_eq!(table.rows[1].form_name.as_deref(), Some("Demographics"));
        assert_eq!(table.rows[1].testing_tier.as_deref(), Some("Tier 2"));
    }

    #[test]
    fn test_read_table_header_case_and_padding() {
        let csv = " custom.formname ,CUSTOM.TESTCASECLASSIFICATION\nVitals,Form Level\n";
        let table = read_table(csv.as_bytes()).unwrap();

        assert!(table.missing_required_columns().is_empty());
        assert_eq!(table.rows[0].form_name.as_deref(), Some("Vitals"));
        assert_eq!(table.rows[0].classification.as_deref(), Some("Form Level"));
    }

    #[test]
    fn test_read_table_short_rows() {
        let csv = "Custom.TestCaseClassification,Custom.FormName,State\nForm Level,AE\n";
        let table = read_table(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].state, None);
    }

    #[test]
    fn test_load_table_missing_file() {
        let err = load_table(Path::new("/nonexistent/requirements.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
