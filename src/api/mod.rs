//! Minimal HTTP surface over [`crate::engine::ScanEngine`].
//!
//! Grounded on `api/routes.rs`'s handler shape
//! (`Json<Req> -> Result<Json<Resp>, StatusCode>`, `AxumState<AppState>`)
//! and `main.rs`'s router-assembly/bind pattern. This is connective tissue,
//! not where business logic lives (spec.md section 1 scopes the core out
//! of the HTTP/job-queue layer).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State as AxumState;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::engine::ScanEngine;
use crate::model::{KYCDecisionOutput, MerchantKYCInput};
use crate::webhook::{self, WebhookPayload, WebhookStatus};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScanEngine>,
    pub http: reqwest::Client,
    /// In-memory job store for the async path. A real deployment would back
    /// this with a persistent queue; that infrastructure lives outside the
    /// core per spec.md section 1.
    pub jobs: Arc<Mutex<HashMap<String, JobRecord>>>,
}

impl AppState {
    pub fn new(engine: ScanEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            http: reqwest::Client::new(),
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub status: JobStatus,
    pub result: Option<KYCDecisionOutput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/scan", post(scan_sync))
        .route("/v1/scan/async", post(scan_async))
        .route("/v1/scan/async/:job_id", axum::routing::get(job_status))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub decision: KYCDecisionOutput,
}

/// `POST /v1/scan` — runs a scan synchronously and returns the decision
/// inline. Callers expect this within the 5-minute SLO from spec.md
/// section 6.
pub async fn scan_sync(
    AxumState(state): AxumState<AppState>,
    Json(input): Json<MerchantKYCInput>,
) -> Result<Json<ScanResponse>, StatusCode> {
    match state.engine.scan(input).await {
        Ok(decision) => Ok(Json(ScanResponse { decision })),
        Err(e) => {
            error!(error = %e, "scan input validation failed");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AsyncScanRequest {
    #[serde(flatten)]
    pub input: MerchantKYCInput,
    pub webhook_url: String,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub extra_headers: Vec<(String, String)>,
}

#[derive(Debug, Serialize)]
pub struct AsyncScanResponse {
    pub job_id: String,
}

/// `POST /v1/scan/async` — enqueues a scan and returns immediately with a
/// job id; the result is delivered to `webhook_url` on completion
/// (spec.md section 6).
pub async fn scan_async(
    AxumState(state): AxumState<AppState>,
    Json(request): Json<AsyncScanRequest>,
) -> Result<Json<AsyncScanResponse>, StatusCode> {
    let job_id = uuid::Uuid::new_v4().to_string();
    state
        .jobs
        .lock()
        .await
        .insert(job_id.clone(), JobRecord { status: JobStatus::Pending, result: None });

    let job_id_for_task = job_id.clone();
    tokio::spawn(run_async_job(state, job_id_for_task, request));

    Ok(Json(AsyncScanResponse { job_id }))
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: &'static str,
    pub result: Option<KYCDecisionOutput>,
}

pub async fn job_status(
    AxumState(state): AxumState<AppState>,
    axum::extract::Path(job_id): axum::extract::Path<String>,
) -> Result<Json<JobStatusResponse>, StatusCode> {
    let jobs = state.jobs.lock().await;
    let record = jobs.get(&job_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(JobStatusResponse {
        job_id,
        status: match record.status {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        },
        result: record.result.clone(),
    }))
}

async fn run_async_job(state: AppState, job_id: String, request: AsyncScanRequest) {
    let started = Instant::now();
    let outcome = state.engine.scan(request.input).await;

    let (status, result, error) = match outcome {
        Ok(decision) => (JobStatus::Completed, Some(decision), None),
        Err(e) => (JobStatus::Failed, None, Some(e.to_string())),
    };

    {
        let mut jobs = state.jobs.lock().await;
        if let Some(record) = jobs.get_mut(&job_id) {
            record.status = status;
            record.result = result.clone();
        }
    }

    let payload = WebhookPayload {
        job_id: job_id.clone(),
        reference_id: request.reference_id,
        status: if status == JobStatus::Completed { WebhookStatus::Completed } else { WebhookStatus::Failed },
        completed_at: Utc::now(),
        duration_seconds: started.elapsed().as_secs_f64(),
        result,
        error,
    };

    if let Err(e) = webhook::deliver(&state.http, &request.webhook_url, &payload, &request.extra_headers).await {
        error!(job_id = %job_id, error = %e, "webhook delivery exhausted all retries");
    } else {
        info!(job_id = %job_id, "webhook delivered");
    }
}
