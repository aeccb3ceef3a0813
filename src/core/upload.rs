//! Upload orchestration
//!
//! Test cases are uploaded strictly one after another, in fixed-size
//! batches. Each case ends with exactly one result row; failures are
//! recorded and the run moves on to the next case. Nothing is retried.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::devops::{
    create_payload, steps_payload, ApiResponse, CreatedWorkItem, Overrides, WorkItemApi,
    TEST_CASE_TYPE,
};
use crate::core::text::truncate;
use crate::entities::test_case::TestCase;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Longest response snippet kept on a failed row
const DETAIL_LIMIT: usize = 100;
/// Longest transport error message kept on an errored row
const ERROR_LIMIT: usize = 100;

/// Batch sizing and pacing for an upload run
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub batch_size: usize,
    /// Pause after every test case
    pub settle_delay: Duration,
    /// Pause between batches when there is more than one
    pub batch_pause: Duration,
    /// Simulated work per case in dry-run mode
    pub dry_run_delay: Duration,
    /// Send the classification and form name custom fields
    pub include_custom_fields: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            settle_delay: Duration::from_millis(500),
            batch_pause: Duration::from_secs(2),
            dry_run_delay: Duration::from_millis(100),
            include_custom_fields: true,
        }
    }
}

impl UploadPolicy {
    /// Default sizing with every delay set to zero
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            batch_pause: Duration::ZERO,
            dry_run_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Outcome of one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Success,
    DryRun,
    /// Remote service answered with a non-2xx status
    Failed(u16),
    /// The exchange could not be completed
    Error(String),
}

impl UploadStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, UploadStatus::Failed(_) | UploadStatus::Error(_))
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::Success => write!(f, "Success"),
            UploadStatus::DryRun => write!(f, "Dry Run"),
            UploadStatus::Failed(code) => write!(f, "Failed ({})", code),
            UploadStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

impl Serialize for UploadStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of uploading one test case.
///
/// Serializes as one record of the results file, so field names are the
/// column headers.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResultRow {
    /// 1-based batch index; `None` when the run had a single batch
    #[serde(rename = "Batch")]
    pub batch: Option<usize>,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Status")]
    pub status: UploadStatus,
    /// Remote work item id, set only on success
    #[serde(rename = "Work Item ID")]
    pub work_item_id: Option<u64>,
    #[serde(rename = "Steps")]
    pub step_count: usize,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Local>,
    /// Truncated response body for failed rows
    #[serde(rename = "Detail")]
    pub detail: Option<String>,
}

impl UploadResultRow {
    /// Batch index as displayed: the number, or "N/A" for a single batch
    pub fn batch_label(&self) -> String {
        self.batch
            .map(|b| b.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Snapshot handed to the progress observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    pub current: usize,
    pub total: usize,
    /// 1-based batch being processed
    pub batch: usize,
    pub batch_count: usize,
    pub message: String,
}

impl UploadProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Counts over a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub total: usize,
    pub successful: usize,
    pub dry_run: usize,
    pub failed: usize,
}

impl UploadSummary {
    pub fn from_results(results: &[UploadResultRow]) -> Self {
        let mut summary = UploadSummary {
            total: results.len(),
            ..Default::default()
        };
        for row in results {
            match row.status {
                UploadStatus::Success => summary.successful += 1,
                UploadStatus::DryRun => summary.dry_run += 1,
                UploadStatus::Failed(_) | UploadStatus::Error(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Number of batches `total` cases split into
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1))
}

/// Upload `cases` in order and return one result row per case.
///
/// With `dry_run` no request is made and every case is recorded as
/// [`UploadStatus::DryRun`]. `on_progress` is called after each case starts
/// and after each batch completes; it only observes the run.
pub fn upload<F>(
    api: &dyn WorkItemApi,
    cases: &[TestCase],
    overrides: &Overrides,
    dry_run: bool,
    policy: &UploadPolicy,
    mut on_progress: F,
) -> Vec<UploadResultRow>
where
    F: FnMut(&UploadProgress),
{
    let total = cases.len();
    let batch_size = policy.batch_size.max(1);
    let batches = batch_count(total, batch_size);
    let mut results: Vec<UploadResultRow> = Vec::with_capacity(total);

    info!(total, batches, dry_run, "Starting upload");

    for (batch_idx, batch) in cases.chunks(batch_size).enumerate() {
        let batch_number = batch_idx + 1;
        let batch_label = (batches > 1).then_some(batch_number);

        for case in batch {
            let current = results.len() + 1;
            on_progress(&UploadProgress {
                current,
                total,
                batch: batch_number,
                batch_count: batches,
                message: format!("Processing: {}", case.title),
            });

            let outcome = if dry_run {
                thread::sleep(policy.dry_run_delay);
                Outcome::status(UploadStatus::DryRun)
            } else {
                upload_case(api, case, overrides, policy.include_custom_fields)
            };

            results.push(UploadResultRow {
                batch: batch_label,
                title: case.title.clone(),
                status: outcome.status,
                work_item_id: outcome.work_item_id,
                step_count: case.step_count(),
                timestamp: Local::now(),
                detail: outcome.detail,
            });

            thread::sleep(policy.settle_delay);
        }

        on_progress(&UploadProgress {
            current: results.len(),
            total,
            batch: batch_number,
            batch_count: batches,
            message: format!("Completed batch {} of {}", batch_number, batches),
        });

        if batch_number < batches {
            thread::sleep(policy.batch_pause);
        }
    }

    results
}

struct Outcome {
    status: UploadStatus,
    work_item_id: Option<u64>,
    detail: Option<String>,
}

impl Outcome {
    fn status(status: UploadStatus) -> Self {
        Self {
            status,
            work_item_id: None,
            detail: None,
        }
    }

    fn failed(response: &ApiResponse) -> Self {
        let detail = if response.body.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            truncate(response.body.trim(), DETAIL_LIMIT)
        };
        Self {
            status: UploadStatus::Failed(response.status),
            work_item_id: None,
            detail: Some(detail),
        }
    }

    fn error(message: impl std::fmt::Display) -> Self {
        Self::status(UploadStatus::Error(truncate(&message.to_string(), ERROR_LIMIT)))
    }
}

/// Create the work item, then attach steps when there are any
fn upload_case(
    api: &dyn WorkItemApi,
    case: &TestCase,
    overrides: &Overrides,
    include_custom_fields: bool,
) -> Outcome {
    let payload = create_payload(case, overrides, include_custom_fields);
    let response = match api.create_work_item(TEST_CASE_TYPE, &payload) {
        Ok(response) => response,
        Err(e) => {
            warn!(title = %case.title, error = %e, "Create request failed");
            return Outcome::error(e);
        }
    };
    if !response.is_success() {
        warn!(
            title = %case.title,
            status = response.status,
            body = %truncate(&response.body, DETAIL_LIMIT),
            "Work item creation rejected"
        );
        return Outcome::failed(&response);
    }

    let id = match serde_json::from_str::<CreatedWorkItem>(&response.body) {
        Ok(created) => created.id,
        Err(e) => {
            warn!(title = %case.title, error = %e, "Unreadable create response");
            return Outcome::error(format!("Could not read work item id: {}", e));
        }
    };

    if case.has_steps() {
        match api.update_work_item(id, &steps_payload(&case.steps)) {
            Ok(update) if update.is_success() => {}
            Ok(update) => {
                warn!(
                    title = %case.title,
                    work_item_id = id,
                    status = update.status,
                    "Work item created but attaching steps was rejected"
                );
                return Outcome::failed(&update);
            }
            Err(e) => {
                warn!(
                    title = %case.title,
                    work_item_id = id,
                    error = %e,
                    "Work item created but attaching steps failed"
                );
                return Outcome::error(e);
            }
        }
    }

    Outcome {
        status: UploadStatus::Success,
        work_item_id: Some(id),
        detail: None,
    }
}
