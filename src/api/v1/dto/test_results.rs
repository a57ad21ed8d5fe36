use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::metrics_store::TestSummary;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultRequest {
    pub build_id: String,
    pub test_name: String,
    /// Parsed into `TestOutcome` handler-side; unsupported values are a 400.
    pub outcome: String,
    pub duration_seconds: f64,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummaryResponse {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub latest_build_id: Option<String>,
    pub last_submitted_at: Option<DateTime<Utc>>,
}

impl From<TestSummary> for TestSummaryResponse {
    fn from(summary: TestSummary) -> Self {
        Self {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
            latest_build_id: summary.latest_build_id,
            last_submitted_at: summary.last_submitted_at,
        }
    }
}
