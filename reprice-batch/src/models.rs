use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker used in place of a SKU for failures that abort the whole job
pub const SYSTEM_SKU: &str = "SYSTEM";

/// Reprice job status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Pending and running jobs hold the single batch slot
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

/// A row (or the job itself) that could not be repriced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowFailure {
    pub sku: String,
    pub error: String,
}

/// One run of the batch repricer over the product table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepriceJob {
    pub id: Uuid,
    pub triggered_by: String,
    pub status: JobStatus,
    pub scanned: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<RowFailure>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RepriceJob {
    pub fn new(triggered_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            triggered_by: triggered_by.into(),
            status: JobStatus::Pending,
            scanned: 0,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn record_success(&mut self) {
        self.scanned += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, sku: impl Into<String>, error: impl Into<String>) {
        self.scanned += 1;
        self.failed += 1;
        self.errors.push(RowFailure {
            sku: sku.into(),
            error: error.into(),
        });
    }

    /// Update status, stamping the completion time for terminal states
    pub fn update_status(&mut self, new_status: JobStatus) {
        self.status = new_status;
        if new_status.is_finished() {
            self.completed_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_pending() {
        let job = RepriceJob::new("manual");
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.status.is_active());
        assert!(job.completed_at.is_none());
        assert_eq!(job.triggered_by, "manual");
    }

    #[test]
    fn test_counters() {
        let mut job = RepriceJob::new("cron");
        job.record_success();
        job.record_success();
        job.record_failure("SKU-3", "Malformed number in column 'Unit Cost': 'abc'");

        assert_eq!(job.scanned, 3);
        assert_eq!(job.succeeded, 2);
        assert_eq!(job.failed, 1);
        assert_eq!(job.errors[0].sku, "SKU-3");
    }

    #[test]
    fn test_terminal_status_stamps_completion() {
        let mut job = RepriceJob::new("cron");
        job.update_status(JobStatus::Running);
        assert!(job.completed_at.is_none());

        job.update_status(JobStatus::Completed);
        assert!(job.completed_at.is_some());
        assert!(job.status.is_finished());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&JobStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
