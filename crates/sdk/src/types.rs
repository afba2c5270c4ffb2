//! SDK Request/Response Types
//!
//! Mirrors the wire format of the daemon's HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /api/v1/jobs`
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub items: Vec<Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl SubmitRequest {
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Response of a detached submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAccepted {
    pub job_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// One item of a job snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub item_id: String,
    pub status: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub duration: Option<i64>,
    pub duration_minutes: Option<String>,
}

/// Job record as streamed by the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: String,
    pub items: Vec<ItemSnapshot>,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub duration: Option<i64>,
    pub duration_minutes: Option<String>,

    /// Caller metadata merged into the record
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl JobSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status != "processing"
    }

    pub fn settled_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status != "processing")
            .count()
    }
}

/// One decoded stream message
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Snapshot(Box<JobSnapshot>),
    /// `{}`: the job is unknown or no longer stored
    Gone,
    /// Query-time failure reported by the daemon
    Error(String),
}

impl JobEvent {
    /// Decode the JSON text of one `data:` frame
    pub fn from_data(data: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(data)?;
        match &value {
            Value::Object(fields) if fields.is_empty() => Ok(JobEvent::Gone),
            Value::Object(fields) if !fields.contains_key("jobId") => {
                match fields.get("error").and_then(Value::as_str) {
                    Some(error) => Ok(JobEvent::Error(error.to_string())),
                    None => Err(crate::SdkError::Other(format!(
                        "unrecognized stream payload: {}",
                        data
                    ))),
                }
            }
            _ => Ok(JobEvent::Snapshot(Box::new(serde_json::from_value(value)?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_snapshot_with_metadata() {
        let data = json!({
            "jobId": "job-1",
            "status": "processing",
            "items": [{
                "itemId": "item-1",
                "status": "completed",
                "startTime": 10,
                "endTime": 20,
                "duration": 10,
                "durationMinutes": "0.00 min"
            }],
            "startTime": 5,
            "endTime": null,
            "duration": null,
            "durationMinutes": null,
            "uploader": "ops"
        })
        .to_string();

        match JobEvent::from_data(&data).unwrap() {
            JobEvent::Snapshot(job) => {
                assert_eq!(job.job_id, "job-1");
                assert!(!job.is_terminal());
                assert_eq!(job.settled_count(), 1);
                assert_eq!(job.metadata["uploader"], "ops");
            }
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_gone_and_error() {
        assert_eq!(JobEvent::from_data("{}").unwrap(), JobEvent::Gone);
        assert_eq!(
            JobEvent::from_data(r#"{"error":"store down"}"#).unwrap(),
            JobEvent::Error("store down".to_string())
        );
        assert!(JobEvent::from_data(r#"{"what":1}"#).is_err());
        assert!(JobEvent::from_data("not json").is_err());
    }

    #[test]
    fn test_submit_request_omits_empty_metadata() {
        let body = serde_json::to_value(SubmitRequest::new(vec![json!("a")])).unwrap();
        assert!(body.get("metadata").is_none());

        let body = serde_json::to_value(
            SubmitRequest::new(vec![]).with_metadata("batch", json!("nightly")),
        )
        .unwrap();
        assert_eq!(body["metadata"]["batch"], "nightly");
    }
}
