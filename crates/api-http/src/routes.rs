//! Routes
//!
//! - POST /api/v1/jobs              submit; streams progress (or `?detach=true` -> 202)
//! - GET  /api/v1/jobs/:id          current record
//! - GET  /api/v1/jobs/:id/events   live status stream
//! - GET  /health

use crate::error::ApiError;
use crate::sse::sse_response;
use crate::state::AppState;
use crate::types::{HealthResponse, SubmitAccepted, SubmitJobBody, SubmitParams};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use batchline_core::application::{observer_channel, SubmitRequest};
use batchline_core::domain::{JobMetadata, JobRecord};
use batchline_core::error::AppError;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: batchline_core::VERSION.to_string(),
    })
}

async fn submit_job(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SubmitParams>,
    Json(body): Json<SubmitJobBody>,
) -> Result<Response, ApiError> {
    let metadata = JobMetadata::try_from(body.metadata).map_err(AppError::from)?;
    let request = SubmitRequest::new(body.items).with_metadata(metadata);

    if params.detach {
        let handle = state
            .engine
            .submit(request, state.processor.clone(), state.hooks.clone(), None)
            .await?;
        let accepted = SubmitAccepted {
            job_id: handle.detach(),
        };
        return Ok((StatusCode::ACCEPTED, Json(accepted)).into_response());
    }

    let (observer, stream) = observer_channel();
    let handle = state
        .engine
        .submit(
            request,
            state.processor.clone(),
            state.hooks.clone(),
            Some(observer),
        )
        .await?;
    debug!(job_id = handle.job_id(), "Streaming job progress");
    handle.detach();

    Ok(sse_response(stream, state.keep_alive))
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .query
        .get(&job_id)
        .await?
        .map(Json)
        .ok_or(ApiError::JobNotFound(job_id))
}

async fn watch_job(State(state): State<Arc<AppState>>, Path(job_id): Path<String>) -> Response {
    let (observer, stream) = observer_channel();
    let query = state.query.clone();

    tokio::spawn(async move {
        let end = query.watch(&job_id, observer).await;
        debug!(job_id = %job_id, ?end, "Watch ended");
    });

    sse_response(stream, state.keep_alive)
}

/// Build the API router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/jobs", post(submit_job))
        .route("/api/v1/jobs/:job_id", get(get_job))
        .route("/api/v1/jobs/:job_id/events", get(watch_job))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::TracingHooks;
    use axum::body::Body;
    use axum::http::{header, Request};
    use batchline_core::application::{EngineConfig, JobEngine, QueryConfig, StatusQuery};
    use batchline_core::port::id_provider::mocks::SequentialIdProvider;
    use batchline_core::port::item_processor::mocks::{MockBehavior, MockItemProcessor};
    use batchline_core::port::time_provider::SystemTimeProvider;
    use batchline_infra_memory::MemoryJobStore;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app_with(store: Arc<MemoryJobStore>, processor: MockItemProcessor) -> Router {
        let engine = JobEngine::new(
            store.clone(),
            Arc::new(SequentialIdProvider::new("job")),
            Arc::new(SystemTimeProvider),
            EngineConfig::default(),
        );
        let query = StatusQuery::new(store, QueryConfig::default());
        let state = AppState::new(engine, query, Arc::new(processor), Arc::new(TracingHooks));
        build_router(Arc::new(state))
    }

    fn app(store: Arc<MemoryJobStore>) -> Router {
        app_with(store, MockItemProcessor::new_success())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// JSON payloads of every `data:` line
    fn data_frames(body: &str) -> Vec<Value> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| serde_json::from_str(data.trim()).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(MemoryJobStore::default()))
            .oneshot(get_req("/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_submit_streams_snapshots_until_final() {
        let store = Arc::new(MemoryJobStore::default());
        let processor = MockItemProcessor::new(vec![
            MockBehavior::Succeed(Duration::ZERO),
            MockBehavior::Fail(Duration::ZERO, "corrupt".to_string()),
        ]);

        let response = app_with(store, processor)
            .oneshot(post_json(
                "/api/v1/jobs",
                json!({"items": ["a.txt", "b.txt"], "metadata": {"uploader": "ops"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::CONNECTION], "keep-alive");

        let frames = data_frames(&body_text(response).await);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0]["status"], "processing");
        assert_eq!(frames[0]["uploader"], "ops");
        assert_eq!(frames[3]["status"], "completed");
        assert_eq!(frames[3]["items"][1]["status"], "failed");
    }

    #[tokio::test]
    async fn test_submit_rejects_reserved_metadata() {
        let response = app(Arc::new(MemoryJobStore::default()))
            .oneshot(post_json(
                "/api/v1/jobs",
                json!({"items": ["a.txt"], "metadata": {"jobId": "mine"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("jobId"));
    }

    #[tokio::test]
    async fn test_submit_rejects_non_object_metadata() {
        let response = app(Arc::new(MemoryJobStore::default()))
            .oneshot(post_json(
                "/api/v1/jobs",
                json!({"items": [], "metadata": [1, 2]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_detached_submit_then_get() {
        let router = app_with(
            Arc::new(MemoryJobStore::default()),
            MockItemProcessor::new_uniform(Duration::from_secs(30)),
        );

        let response = router
            .clone()
            .oneshot(post_json("/api/v1/jobs?detach=true", json!({"items": ["a"]})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let accepted: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(accepted["jobId"], "job-1");

        let response = router.oneshot(get_req("/api/v1/jobs/job-1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let job: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(job["status"], "processing");
        assert_eq!(job["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_job_is_404() {
        let response = app(Arc::new(MemoryJobStore::default()))
            .oneshot(get_req("/api/v1/jobs/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_watch_unknown_job_sends_empty_final_event() {
        let response = app(Arc::new(MemoryJobStore::default()))
            .oneshot(get_req("/api/v1/jobs/nope/events"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let frames = data_frames(&body_text(response).await);
        assert_eq!(frames, vec![json!({})]);
    }
}
