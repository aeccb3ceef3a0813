//! Summary statistics for loaded tables and processed test cases

use crate::entities::row::RawTable;
use crate::entities::test_case::{TestCase, TestCaseKind};

/// Overview of a loaded requirements table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    pub rows: usize,
    pub columns: usize,
    /// Row count per classification value, in first-seen order
    pub classifications: Vec<(String, usize)>,
    pub unique_forms: usize,
    pub missing_columns: Vec<String>,
}

impl TableStats {
    pub fn from_table(table: &RawTable) -> Self {
        let mut classifications: Vec<(String, usize)> = Vec::new();
        for value in table.rows.iter().filter_map(|r| r.classification.as_deref()) {
            match classifications.iter_mut().find(|(c, _)| c == value) {
                Some((_, count)) => *count += 1,
                None => classifications.push((value.to_string(), 1)),
            }
        }

        let mut forms: Vec<&str> = table
            .rows
            .iter()
            .filter_map(|r| r.form_name.as_deref())
            .collect();
        forms.sort_unstable();
        forms.dedup();

        Self {
            rows: table.rows.len(),
            columns: table.headers.len(),
            classifications,
            unique_forms: forms.len(),
            missing_columns: table.missing_required_columns(),
        }
    }
}

/// Overview of processed test cases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseStats {
    pub total: usize,
    /// Case count per kind, in first-seen order
    pub by_kind: Vec<(TestCaseKind, usize)>,
    pub total_steps: usize,
}

impl CaseStats {
    pub fn from_cases(cases: &[TestCase]) -> Self {
        let mut by_kind: Vec<(TestCaseKind, usize)> = Vec::new();
        for case in cases {
            match by_kind.iter_mut().find(|(k, _)| *k == case.kind) {
                Some((_, count)) => *count += 1,
                None => by_kind.push((case.kind, 1)),
            }
        }

        Self {
            total: cases.len(),
            by_kind,
            total_steps: cases.iter().map(TestCase::step_count).sum(),
        }
    }
}
