// Caller supplied passthrough fields merged into a job record

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names owned by the job record itself
pub const RESERVED_KEYS: [&str; 7] = [
    "jobId",
    "status",
    "items",
    "startTime",
    "endTime",
    "duration",
    "durationMinutes",
];

/// Opaque key-value extension of a job record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobMetadata(Map<String, Value>);

impl JobMetadata {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Reject keys that would shadow record fields once flattened
    pub fn validate(&self) -> Result<()> {
        match self.0.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
            Some(key) => Err(DomainError::ReservedMetadataKey(key.clone())),
            None => Ok(()),
        }
    }
}

impl TryFrom<Value> for JobMetadata {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Ok(Self::default()),
            other => Err(DomainError::ValidationError(format!(
                "metadata must be a JSON object, got {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_accepts_free_form_keys() {
        let metadata = JobMetadata::try_from(json!({"uploader": "ana", "batch": 3})).unwrap();
        assert!(metadata.validate().is_ok());
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn test_validate_rejects_reserved_key() {
        let metadata = JobMetadata::try_from(json!({"status": "completed"})).unwrap();
        let err = metadata.validate().unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn test_try_from_non_object() {
        assert!(JobMetadata::try_from(json!([1, 2])).is_err());
        assert!(JobMetadata::try_from(Value::Null).unwrap().is_empty());
    }
}
