//! Structured test cases produced from the requirements table

use serde::Serialize;

use crate::entities::row::Classification;

/// Shape of a generated test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseKind {
    /// One per Form-Level row, carrying the fixed form review steps
    Standalone,
    /// All Field-Level rows of a form sharing one effective tier
    FieldReviews,
    /// All Edit-Check-Level rows of a form sharing one effective tier
    EditCheckReviews,
}

impl TestCaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCaseKind::Standalone => "standalone",
            TestCaseKind::FieldReviews => "field_reviews",
            TestCaseKind::EditCheckReviews => "edit_check_reviews",
        }
    }

    /// Human-readable label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            TestCaseKind::Standalone => "Standalone (Form Level)",
            TestCaseKind::FieldReviews => "Field Reviews",
            TestCaseKind::EditCheckReviews => "Edit Check Reviews",
        }
    }
}

impl std::fmt::Display for TestCaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single test step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// 1-based position inside the owning test case
    pub step_number: usize,
    pub action: String,
    pub expected: String,
    /// Field or edit-check name the step was generated from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
}

/// A test case ready for export or upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    #[serde(rename = "type")]
    pub kind: TestCaseKind,
    pub title: String,
    pub form_name: String,
    pub classification: Classification,
    /// Effective testing tier; empty when none could be determined
    pub testing_tier: String,
    pub description: String,
    pub area_path: String,
    pub iteration_path: String,
    pub state: String,
    pub steps: Vec<Step>,
}

impl TestCase {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn has_steps(&self) -> bool {
        !self.steps.is_empty()
    }
}
