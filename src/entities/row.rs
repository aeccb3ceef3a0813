//! Raw input rows (one CSV record of the requirements table)

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Column holding the row classification (mandatory)
pub const COL_CLASSIFICATION: &str = "Custom.TestCaseClassification";
/// Column holding the form name (mandatory)
pub const COL_FORM_NAME: &str = "Custom.FormName";
pub const COL_TEXT: &str = "Custom.FieldorEditCheckText";
pub const COL_FIELD_NAME: &str = "Custom.FieldName";
pub const COL_EDIT_CHECK_NAME: &str = "Custom.EditCheckName";
pub const COL_TESTING_TIER: &str = "Custom.TestingTier";
pub const COL_AREA_PATH: &str = "Area Path";
pub const COL_ITERATION_PATH: &str = "Iteration Path";
pub const COL_STATE: &str = "State";

/// Columns that must be present before any processing happens
pub const REQUIRED_COLUMNS: [&str; 2] = [COL_CLASSIFICATION, COL_FORM_NAME];

/// State assigned to work items when the row leaves it blank
pub const DEFAULT_STATE: &str = "Design";

/// Scope of a requirement row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Form Level")]
    FormLevel,
    #[serde(rename = "Field Level")]
    FieldLevel,
    #[serde(rename = "Edit Check Level")]
    EditCheckLevel,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::FormLevel => "Form Level",
            Classification::FieldLevel => "Field Level",
            Classification::EditCheckLevel => "Edit Check Level",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "form level" => Ok(Classification::FormLevel),
            "field level" => Ok(Classification::FieldLevel),
            "edit check level" => Ok(Classification::EditCheckLevel),
            other => Err(format!("Unknown classification: '{}'", other)),
        }
    }
}

/// Depth of review requested for a field or edit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestingTier {
    Tier1,
    Tier2,
    Tier3,
}

impl TestingTier {
    /// Parse a tier label such as "Tier 2" or "tier2".
    ///
    /// Returns `None` for blank or unrecognised values; those select the
    /// fallback expected-result text.
    pub fn parse(s: &str) -> Option<Self> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "tier1" => Some(TestingTier::Tier1),
            "tier2" => Some(TestingTier::Tier2),
            "tier3" => Some(TestingTier::Tier3),
            _ => None,
        }
    }
}

impl std::fmt::Display for TestingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestingTier::Tier1 => write!(f, "Tier 1"),
            TestingTier::Tier2 => write!(f, "Tier 2"),
            TestingTier::Tier3 => write!(f, "Tier 3"),
        }
    }
}

/// One record of the input table.
///
/// Values are trimmed at load time and blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub classification: Option<String>,
    pub form_name: Option<String>,
    pub text: Option<String>,
    pub field_name: Option<String>,
    pub edit_check_name: Option<String>,
    pub testing_tier: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    pub state: Option<String>,
}

impl RawRow {
    /// Parsed classification, if the cell holds a known value
    pub fn classification(&self) -> Option<Classification> {
        self.classification.as_deref()?.parse().ok()
    }

    /// Trimmed testing tier, empty when absent
    pub fn tier(&self) -> &str {
        self.testing_tier.as_deref().map(str::trim).unwrap_or("")
    }

    /// Work item state, falling back to [`DEFAULT_STATE`]
    pub fn state(&self) -> String {
        self.state
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATE.to_string())
    }
}

/// The whole input table: trimmed headers plus typed rows
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    /// Check for a column by name, ignoring case and surrounding whitespace
    pub fn has_column(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .any(|h| h.trim().to_lowercase() == wanted)
    }

    /// Mandatory columns the table does not carry, in declaration order
    pub fn missing_required_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_parse() {
        assert_eq!(
            "Form Level".parse::<Classification>(),
            Ok(Classification::FormLevel)
        );
        assert_eq!(
            "  field level ".parse::<Classification>(),
            Ok(Classification::FieldLevel)
        );
        assert_eq!(
            "Edit Check Level".parse::<Classification>(),
            Ok(Classification::EditCheckLevel)
        );
        assert!("Page Level".parse::<Classification>().is_err());
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(TestingTier::parse("Tier 1"), Some(TestingTier::Tier1));
        assert_eq!(TestingTier::parse("tier2"), Some(TestingTier::Tier2));
        assert_eq!(TestingTier::parse(" TIER 3 "), Some(TestingTier::Tier3));
        assert_eq!(TestingTier::parse(""), None);
        assert_eq!(TestingTier::parse("Tier 4"), None);
    }

    #[test]
    fn test_row_state_default() {
        let row = RawRow::default();
        assert_eq!(row.state(), "Design");

        let row = RawRow {
            state: Some("Ready".to_string()),
            ..Default::default()
        };
        assert_eq!(row.state(), "Ready");
    }

    #[test]
    fn test_missing_required_columns() {
        let table = RawTable::new(
            vec![" custom.testcaseclassification ".to_string()],
            Vec::new(),
        );
        assert_eq!(table.missing_required_columns(), vec![COL_FORM_NAME]);
    }
}
