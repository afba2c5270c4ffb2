//! Request/Response Types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// POST /api/v1/jobs body
#[derive(Debug, Deserialize)]
pub struct SubmitJobBody {
    pub items: Vec<Value>,
    #[serde(default)]
    pub metadata: Value,
}

/// POST /api/v1/jobs query string
#[derive(Debug, Default, Deserialize)]
pub struct SubmitParams {
    /// Run without streaming, answer `202` with the job id
    #[serde(default)]
    pub detach: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAccepted {
    pub job_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
