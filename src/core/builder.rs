//! Test case builder
//!
//! Turns the flat requirements table into structured test cases:
//!
//! - every Form-Level row becomes a standalone "Form Review" case with the
//!   fixed form review steps
//! - Field-Level and Edit-Check-Level rows are grouped per form and per
//!   effective testing tier, one step per row
//!
//! Rows with a blank tier inherit the tier of their form's Form-Level row.
//! Forms without such a tier are reported back as a data quality warning.

use thiserror::Error;
use tracing::debug;

use crate::core::text::normalize_text;
use crate::entities::row::{Classification, RawRow, RawTable, TestingTier};
use crate::entities::test_case::{Step, TestCase, TestCaseKind};

/// Steps attached to every standalone form review, in order
pub const FORM_REVIEW_STEPS: [(&str, &str); 4] = [
    (
        "Review the form and confirm every field in the specification is present.",
        "All fields defined in the specification are present on the form; no extra or missing fields.",
    ),
    (
        "Review the order of the fields on the form.",
        "Fields appear in the order defined in the specification.",
    ),
    (
        "Attempt to save the form leaving each required field blank.",
        "Required fields are enforced as defined in the specification.",
    ),
    (
        "Review field dynamics (fields shown, hidden or enabled based on other responses).",
        "Field dynamics behave as defined in the specification.",
    ),
];

const FIELD_TIER1_EXPECTED: &str = "Field name, field label, SAS label, format, length, pick lists, value choices and calculation match the specification.";
const FIELD_TIER2_EXPECTED: &str =
    "Format, length, pick lists, value choices and calculation match the specification.";
const FIELD_TIER3_EXPECTED: &str = "Format, length and calculation match the specification.";

const EDIT_CHECK_TIER1_EXPECTED: &str = "Edit check fires on positive test data and does not fire on negative test data, range boundaries are enforced, query text matches the specification, and the check is programmed as specified.";
const EDIT_CHECK_TIER2_EXPECTED: &str =
    "Query text matches the specification and the check is programmed as specified.";
const EDIT_CHECK_TIER3_EXPECTED: &str = "Edit check is programmed as specified.";

/// Validation failures that stop processing before any test case is built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

/// Successful output of [`build`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedCases {
    pub test_cases: Vec<TestCase>,
    /// Forms whose Form-Level testing tier is missing or blank
    pub forms_with_null_tier: Vec<String>,
}

impl ProcessedCases {
    pub fn total_steps(&self) -> usize {
        self.test_cases.iter().map(TestCase::step_count).sum()
    }
}

/// Build test cases from a loaded table.
///
/// The input rows are never modified.
pub fn build(table: &RawTable) -> Result<ProcessedCases, BuildError> {
    let missing = table.missing_required_columns();
    if !missing.is_empty() {
        return Err(BuildError::MissingColumns { missing });
    }

    let mut output = ProcessedCases::default();

    for (form_name, rows) in partition_by_form(&table.rows) {
        let form_tier = form_level_tier(&rows);
        if form_tier.is_empty() {
            output.forms_with_null_tier.push(form_name.to_string());
        }

        for row in rows
            .iter()
            .filter(|r| r.classification() == Some(Classification::FormLevel))
        {
            output.test_cases.push(form_review(form_name, row));
        }

        for kind in [TestCaseKind::FieldReviews, TestCaseKind::EditCheckReviews] {
            let classification = match kind {
                TestCaseKind::FieldReviews => Classification::FieldLevel,
                _ => Classification::EditCheckLevel,
            };
            let item_rows: Vec<&RawRow> = rows
                .iter()
                .copied()
                .filter(|r| r.classification() == Some(classification))
                .collect();

            for (tier, group) in group_by_tier(&item_rows, &form_tier) {
                output
                    .test_cases
                    .push(grouped_review(kind, form_name, &tier, &group));
            }
        }

        for row in rows.iter().filter(|r| r.classification().is_none()) {
            debug!(
                form = form_name,
                classification = row.classification.as_deref().unwrap_or(""),
                "Skipping row with unrecognised classification"
            );
        }
    }

    Ok(output)
}

/// Partition rows by form name in first-encounter order, dropping rows
/// without a form name
fn partition_by_form(rows: &[RawRow]) -> Vec<(&str, Vec<&RawRow>)> {
    let mut forms: Vec<(&str, Vec<&RawRow>)> = Vec::new();
    for row in rows {
        let Some(form) = row.form_name.as_deref().map(str::trim).filter(|f| !f.is_empty()) else {
            continue;
        };
        match forms.iter_mut().find(|(name, _)| *name == form) {
            Some((_, members)) => members.push(row),
            None => forms.push((form, vec![row])),
        }
    }
    forms
}

/// Tier of the form's Form-Level row, or empty when it has none
fn form_level_tier(rows: &[&RawRow]) -> String {
    rows.iter()
        .filter(|r| r.classification() == Some(Classification::FormLevel))
        .map(|r| r.tier())
        .find(|t| !t.is_empty())
        .map(canonical_tier)
        .unwrap_or_default()
}

/// Recognised tiers in their display form ("tier1" becomes "Tier 1"),
/// anything else verbatim
fn canonical_tier(raw: &str) -> String {
    TestingTier::parse(raw)
        .map(|t| t.to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Group item rows by effective tier, inheriting `form_tier` when blank.
/// Groups keep first-encounter order and rows keep input order.
fn group_by_tier<'a>(rows: &[&'a RawRow], form_tier: &str) -> Vec<(String, Vec<&'a RawRow>)> {
    let mut groups: Vec<(String, Vec<&'a RawRow>)> = Vec::new();
    for &row in rows {
        let tier = match row.tier() {
            "" => form_tier.to_string(),
            explicit => canonical_tier(explicit),
        };
        match groups.iter_mut().find(|(t, _)| *t == tier) {
            Some((_, members)) => members.push(row),
            None => groups.push((tier, vec![row])),
        }
    }
    groups
}

fn form_review(form_name: &str, row: &RawRow) -> TestCase {
    let steps = FORM_REVIEW_STEPS
        .iter()
        .enumerate()
        .map(|(i, (action, expected))| Step {
            step_number: i + 1,
            action: action.to_string(),
            expected: expected.to_string(),
            source_name: None,
        })
        .collect();

    TestCase {
        kind: TestCaseKind::Standalone,
        title: format!("{} - Form Review", form_name),
        form_name: form_name.to_string(),
        classification: Classification::FormLevel,
        testing_tier: canonical_tier(row.tier()),
        description: normalize_text(row.text.as_deref()),
        area_path: row.area_path.clone().unwrap_or_default(),
        iteration_path: row.iteration_path.clone().unwrap_or_default(),
        state: row.state(),
        steps,
    }
}

fn grouped_review(kind: TestCaseKind, form_name: &str, tier: &str, rows: &[&RawRow]) -> TestCase {
    let parsed_tier = TestingTier::parse(tier);
    let steps: Vec<Step> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let text = normalize_text(row.text.as_deref());
            let (name, action, expected) = match kind {
                TestCaseKind::EditCheckReviews => {
                    let name = row.edit_check_name.clone().unwrap_or_default();
                    let action = with_text(format!("Review Edit Check: {}", name), &text);
                    let expected = edit_check_expected(parsed_tier, &name, &text);
                    (name, action, expected)
                }
                _ => {
                    let name = row.field_name.clone().unwrap_or_default();
                    let action = with_text(format!("Review field: {}", name), &text);
                    let expected = field_expected(parsed_tier, &name, &text);
                    (name, action, expected)
                }
            };
            Step {
                step_number: i + 1,
                action,
                expected,
                source_name: Some(name).filter(|n| !n.is_empty()),
            }
        })
        .collect();

    let (title, classification, description) = match kind {
        TestCaseKind::EditCheckReviews => (
            format!("{} - Edit Check Reviews", form_name),
            Classification::EditCheckLevel,
            format!(
                "Edit check validation for form {}{}. Total checks: {}",
                form_name,
                tier_suffix(tier),
                steps.len()
            ),
        ),
        _ => (
            format!("{} - Field Reviews", form_name),
            Classification::FieldLevel,
            format!(
                "Field-level validation for form {}{}. Total fields: {}",
                form_name,
                tier_suffix(tier),
                steps.len()
            ),
        ),
    };

    // Metadata comes from the first row of the group
    let first = rows.first();
    TestCase {
        kind,
        title,
        form_name: form_name.to_string(),
        classification,
        testing_tier: tier.to_string(),
        description,
        area_path: first.and_then(|r| r.area_path.clone()).unwrap_or_default(),
        iteration_path: first
            .and_then(|r| r.iteration_path.clone())
            .unwrap_or_default(),
        state: first.map(|r| r.state()).unwrap_or_else(|| RawRow::default().state()),
        steps,
    }
}

fn with_text(action: String, text: &str) -> String {
    if text.is_empty() {
        action
    } else {
        format!("{} ({})", action, text)
    }
}

fn tier_suffix(tier: &str) -> String {
    if tier.is_empty() {
        String::new()
    } else {
        format!(" ({})", tier)
    }
}

fn field_expected(tier: Option<TestingTier>, name: &str, text: &str) -> String {
    match tier {
        Some(TestingTier::Tier1) => FIELD_TIER1_EXPECTED.to_string(),
        Some(TestingTier::Tier2) => FIELD_TIER2_EXPECTED.to_string(),
        Some(TestingTier::Tier3) => FIELD_TIER3_EXPECTED.to_string(),
        None => format!("Field '{}' validates correctly. {}", name, text)
            .trim_end()
            .to_string(),
    }
}

fn edit_check_expected(tier: Option<TestingTier>, name: &str, text: &str) -> String {
    match tier {
        Some(TestingTier::Tier1) => EDIT_CHECK_TIER1_EXPECTED.to_string(),
        Some(TestingTier::Tier2) => EDIT_CHECK_TIER2_EXPECTED.to_string(),
        Some(TestingTier::Tier3) => EDIT_CHECK_TIER3_EXPECTED.to_string(),
        None => format!("Edit check '{}' functions correctly. {}", name, text)
            .trim_end()
            .to_string(),
    }
}
