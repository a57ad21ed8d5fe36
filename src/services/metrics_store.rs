/*
 * Responsibility
 * - In-memory test-result aggregate store (the protected resource)
 * - Kept deliberately thin; the interesting logic lives in services/auth
 */
use std::str::FromStr;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
    Skipped,
}

impl TestOutcome {
    pub const SUPPORTED: &[&str] = &["Passed", "Failed", "Skipped"];
}

impl FromStr for TestOutcome {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestResult {
    pub build_id: String,
    pub test_name: String,
    pub outcome: TestOutcome,
    pub duration_seconds: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct TestSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub latest_build_id: Option<String>,
    pub last_submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MetricsStore {
    results: RwLock<Vec<TestResult>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, result: TestResult) {
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        results.push(result);
    }

    pub fn summary(&self) -> TestSummary {
        let results = self.results.read().unwrap_or_else(|e| e.into_inner());
        let mut summary = TestSummary {
            total: results.len() as u64,
            ..TestSummary::default()
        };
        for result in results.iter() {
            match result.outcome {
                TestOutcome::Passed => summary.passed += 1,
                TestOutcome::Failed => summary.failed += 1,
                TestOutcome::Skipped => summary.skipped += 1,
            }
        }
        if let Some(last) = results.last() {
            summary.latest_build_id = Some(last.build_id.clone());
            summary.last_submitted_at = Some(last.completed_at);
        }
        summary
    }

    pub fn clear(&self) {
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(build: &str, outcome: TestOutcome) -> TestResult {
        TestResult {
            build_id: build.to_string(),
            test_name: "login_works".to_string(),
            outcome,
            duration_seconds: 1.5,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn summary_counts_outcomes() {
        let store = MetricsStore::new();
        store.add(result("b1", TestOutcome::Passed));
        store.add(result("b1", TestOutcome::Failed));
        store.add(result("b2", TestOutcome::Skipped));

        let summary = store.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.latest_build_id.as_deref(), Some("b2"));
    }

    #[test]
    fn clear_resets_the_store() {
        let store = MetricsStore::new();
        store.add(result("b1", TestOutcome::Passed));
        store.clear();
        let summary = store.summary();
        assert_eq!(summary.total, 0);
        assert!(summary.latest_build_id.is_none());
    }

    #[test]
    fn outcome_parsing_is_case_insensitive() {
        assert_eq!("PASSED".parse::<TestOutcome>(), Ok(TestOutcome::Passed));
        assert_eq!("skipped".parse::<TestOutcome>(), Ok(TestOutcome::Skipped));
        assert!("exploded".parse::<TestOutcome>().is_err());
    }
}
