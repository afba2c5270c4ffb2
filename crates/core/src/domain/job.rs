// Job Domain Model
//
// A job is an ordered batch of items. Every record starts in PROCESSING and is
// settled exactly once; the transition methods below refuse to touch a record
// that is already terminal.

use super::error::{DomainError, Result};
use super::metadata::JobMetadata;
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4 in production, injected for tests)
pub type JobId = String;

/// Item ID, generated when the job is created
pub type ItemId = String;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Status shared by jobs and items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Human readable duration, e.g. `95_000` -> `"1.58 min"`
pub fn format_duration_minutes(duration_ms: i64) -> String {
    format!("{:.2} min", duration_ms as f64 / MILLIS_PER_MINUTE)
}

/// One unit of work inside a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub item_id: ItemId,
    pub status: JobStatus,
    pub start_time: Option<i64>, // epoch ms
    pub end_time: Option<i64>,
    pub duration: Option<i64>, // ms
    pub duration_minutes: Option<String>,
}

impl ItemRecord {
    /// Create an item that has not started yet (all timings null)
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            status: JobStatus::Processing,
            start_time: None,
            end_time: None,
            duration: None,
            duration_minutes: None,
        }
    }

    /// Stamp the start time. Fails if the item already started or settled.
    pub fn begin(&mut self, now_millis: i64) -> Result<()> {
        if self.status.is_terminal() || self.start_time.is_some() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "started".to_string(),
            });
        }
        self.start_time = Some(now_millis);
        Ok(())
    }

    /// Settle a started item as COMPLETED or FAILED, deriving its timings
    pub fn settle(&mut self, now_millis: i64, outcome: JobStatus) -> Result<()> {
        let start = match (self.status, self.start_time) {
            (JobStatus::Processing, Some(start)) if outcome.is_terminal() => start,
            _ => {
                return Err(DomainError::InvalidStateTransition {
                    from: self.status.to_string(),
                    to: outcome.to_string(),
                })
            }
        };

        let duration = now_millis - start;
        self.end_time = Some(now_millis);
        self.duration = Some(duration);
        self.duration_minutes = Some(format_duration_minutes(duration));
        self.status = outcome;
        Ok(())
    }
}

/// Job record as stored and streamed to observers.
///
/// Caller metadata is flattened into the same JSON object, so a snapshot looks like
/// `{"jobId": .., "status": .., "items": [..], "startTime": .., "batch": "nightly"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: JobId,
    pub status: JobStatus,
    pub items: Vec<ItemRecord>,
    pub start_time: i64, // epoch ms
    pub end_time: Option<i64>,
    pub duration: Option<i64>,
    pub duration_minutes: Option<String>,

    #[serde(flatten)]
    pub metadata: JobMetadata,
}

impl JobRecord {
    /// Create a new job in PROCESSING state
    ///
    /// # Arguments
    ///
    /// * `job_id` - Unique job ID (injected, not generated)
    /// * `item_ids` - One ID per item, in processing order
    /// * `started_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `metadata` - Caller supplied passthrough fields
    pub fn new(
        job_id: impl Into<String>,
        item_ids: Vec<ItemId>,
        started_at: i64,
        metadata: JobMetadata,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Processing,
            items: item_ids.into_iter().map(ItemRecord::new).collect(),
            start_time: started_at,
            end_time: None,
            duration: None,
            duration_minutes: None,
            metadata,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn item_mut(&mut self, index: usize) -> Result<&mut ItemRecord> {
        let job_id = &self.job_id;
        self.items
            .get_mut(index)
            .ok_or_else(|| DomainError::ItemNotFound {
                job_id: job_id.clone(),
                index,
            })
    }

    /// Number of items that reached a terminal status
    pub fn settled_count(&self) -> usize {
        self.items.iter().filter(|i| i.status.is_terminal()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == JobStatus::Failed)
            .count()
    }

    /// The single terminal write for a job
    pub fn finalize(&mut self, now_millis: i64, outcome: JobStatus) -> Result<()> {
        if self.is_terminal() || !outcome.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: outcome.to_string(),
            });
        }

        let duration = now_millis - self.start_time;
        self.end_time = Some(now_millis);
        self.duration = Some(duration);
        self.duration_minutes = Some(format_duration_minutes(duration));
        self.status = outcome;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_item_job() -> JobRecord {
        JobRecord::new(
            "job-1",
            vec!["item-a".to_string(), "item-b".to_string()],
            1_000,
            JobMetadata::default(),
        )
    }

    #[test]
    fn test_new_job_starts_processing_with_null_item_timings() {
        let job = two_item_job();

        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.items.len(), 2);
        for item in &job.items {
            assert_eq!(item.status, JobStatus::Processing);
            assert!(item.start_time.is_none());
            assert!(item.end_time.is_none());
            assert!(item.duration.is_none());
            assert!(item.duration_minutes.is_none());
        }
    }

    #[test]
    fn test_item_settle_derives_duration() {
        let mut job = two_item_job();
        let item = job.item_mut(0).unwrap();
        item.begin(2_000).unwrap();
        item.settle(2_450, JobStatus::Completed).unwrap();

        assert_eq!(item.status, JobStatus::Completed);
        assert_eq!(item.end_time, Some(2_450));
        assert_eq!(item.duration, Some(450));
        assert_eq!(item.duration_minutes.as_deref(), Some("0.01 min"));
    }

    #[test]
    fn test_item_cannot_be_settled_twice() {
        let mut item = ItemRecord::new("item");
        item.begin(10).unwrap();
        item.settle(20, JobStatus::Failed).unwrap();

        assert!(item.settle(30, JobStatus::Completed).is_err());
        assert!(item.begin(40).is_err());
        assert_eq!(item.status, JobStatus::Failed);
        assert_eq!(item.end_time, Some(20));
    }

    #[test]
    fn test_item_must_start_before_settling() {
        let mut item = ItemRecord::new("item");
        let err = item.settle(30, JobStatus::Completed).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_finalize_is_single_terminal_write() {
        let mut job = two_item_job();
        job.finalize(61_000, JobStatus::Completed).unwrap();

        assert_eq!(job.duration, Some(60_000));
        assert_eq!(job.duration_minutes.as_deref(), Some("1.00 min"));
        assert!(job.finalize(62_000, JobStatus::Failed).is_err());
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn test_finalize_rejects_processing_target() {
        let mut job = two_item_job();
        assert!(job.finalize(2_000, JobStatus::Processing).is_err());
    }

    #[test]
    fn test_item_mut_out_of_range() {
        let mut job = two_item_job();
        assert!(matches!(
            job.item_mut(5),
            Err(DomainError::ItemNotFound { index: 5, .. })
        ));
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration_minutes(0), "0.00 min");
        assert_eq!(format_duration_minutes(95_000), "1.58 min");
        assert_eq!(format_duration_minutes(600_000), "10.00 min");
    }

    #[test]
    fn test_snapshot_serializes_camel_case_with_flattened_metadata() {
        let mut metadata = JobMetadata::default();
        metadata.insert("batch", json!("nightly"));
        let job = JobRecord::new("job-9", vec!["i-1".to_string()], 5, metadata);

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["jobId"], "job-9");
        assert_eq!(value["status"], "processing");
        assert_eq!(value["startTime"], 5);
        assert_eq!(value["endTime"], serde_json::Value::Null);
        assert_eq!(value["batch"], "nightly");
        assert_eq!(value["items"][0]["itemId"], "i-1");
        assert_eq!(value["items"][0]["durationMinutes"], serde_json::Value::Null);

        let back: JobRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, job);
    }
}
