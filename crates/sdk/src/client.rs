//! Batchline Client Implementation

use crate::error::{Result, SdkError};
use crate::sse::data_frames;
use crate::types::{HealthResponse, JobEvent, JobSnapshot, SubmitAccepted, SubmitRequest};
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Batchline daemon client
///
/// # Example
///
/// ```no_run
/// use batchline_sdk::BatchlineClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = BatchlineClient::connect("http://127.0.0.1:9630")?;
/// let health = client.health().await?;
/// println!("daemon {}", health.version);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BatchlineClient {
    client: Client,
    base_url: String,
}

impl BatchlineClient {
    /// Create a client for the daemon at `url` (e.g., `http://127.0.0.1:9630`)
    ///
    /// No request is made; connection errors surface on the first call.
    pub fn connect(url: impl AsRef<str>) -> Result<Self> {
        let base_url = url.as_ref().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SdkError::InvalidUrl(base_url));
        }

        // No overall request timeout: event streams stay open for the whole job
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// Submit a job and follow its progress
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobEventStream> {
        let response = self
            .client
            .post(format!("{}/api/v1/jobs", self.base_url))
            .json(&request)
            .send()
            .await?;
        Ok(JobEventStream::new(check(response).await?))
    }

    /// Submit a job without streaming, returning its id
    pub async fn submit_detached(&self, request: SubmitRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/v1/jobs?detach=true", self.base_url))
            .json(&request)
            .send()
            .await?;
        let accepted: SubmitAccepted = check(response).await?.json().await?;
        Ok(accepted.job_id)
    }

    /// Current record, `None` for unknown or finished jobs
    pub async fn status(&self, job_id: &str) -> Result<Option<JobSnapshot>> {
        let response = self
            .client
            .get(format!("{}/api/v1/jobs/{}", self.base_url, job_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.json().await?))
    }

    /// Follow a running job
    pub async fn watch(&self, job_id: &str) -> Result<JobEventStream> {
        let response = self
            .client
            .get(format!("{}/api/v1/jobs/{}/events", self.base_url, job_id))
            .send()
            .await?;
        Ok(JobEventStream::new(check(response).await?))
    }
}

/// Map non-success statuses to `SdkError::Http`, reading the `{"error"}` body
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    Err(SdkError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Events of one job stream, in order
pub struct JobEventStream {
    frames: BoxStream<'static, Result<String>>,
}

impl JobEventStream {
    fn new(response: Response) -> Self {
        Self {
            frames: data_frames(response.bytes_stream()),
        }
    }

    /// Next event, or `None` once the daemon closed the stream
    pub async fn next(&mut self) -> Result<Option<JobEvent>> {
        match self.frames.next().await {
            Some(frame) => JobEvent::from_data(&frame?).map(Some),
            None => Ok(None),
        }
    }

    /// Read to the end, returning every event
    pub async fn collect(mut self) -> Result<Vec<JobEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await? {
            events.push(event);
        }
        Ok(events)
    }
}
