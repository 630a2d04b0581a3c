//! HTTP surface: submit, status, single-job lookup, cancel.
//!
//! The transport stays thin. It runs the allow-list check, hands
//! validated specs to the scheduler, and serializes snapshots; all
//! scheduling decisions live behind [`Scheduler`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::allowlist::Allowlist;
use crate::error::{Result, RunnerError};
use crate::scheduler::{CommandSpec, Scheduler};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Scheduler,
    pub allowlist: Arc<Allowlist>,
}

#[derive(Serialize)]
struct SubmitResponse {
    #[serde(rename = "jobId")]
    job_id: Uuid,
}

#[derive(Serialize)]
struct CancelResponse {
    #[serde(rename = "jobId")]
    job_id: Uuid,
    outcome: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    // The original consumer is a browser extension; stay permissive.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/jobs", post(submit_handler))
        .route("/api/jobs/{id}", get(get_job_handler))
        .route("/api/jobs/{id}/cancel", post(cancel_handler))
        .route("/api/status", get(status_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the shutdown token fires.
pub async fn serve(addr: SocketAddr, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let app = router(state);

    tracing::info!(addr = %addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(spec): Json<CommandSpec>,
) -> Response {
    if !state.allowlist.is_allowed(&spec.command) {
        tracing::warn!(command = %spec.command, "Rejected command not on the allow-list");
        let error = RunnerError::CommandNotAllowed(spec.command);
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: error.to_string(),
            }),
        )
            .into_response();
    }

    let job_id = state.scheduler.submit(spec).await;
    Json(SubmitResponse { job_id }).into_response()
}

async fn status_handler(State(state): State<AppState>) -> Response {
    Json(state.scheduler.status().await).into_response()
}

async fn get_job_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.scheduler.get(id).await {
        Some(job) => Json(job).into_response(),
        None => {
            let error = RunnerError::JobNotFound(id);
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: error.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Cancellation always reports success; a miss is a no-op, not a fault.
async fn cancel_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let outcome = state.scheduler.cancel(id).await;
    Json(CancelResponse {
        job_id: id,
        outcome: outcome.as_str(),
    })
    .into_response()
}
