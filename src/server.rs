//! Thin HTTP surface.
//!
//! One route, `GET /process?path=<server-local path>[&archive=true]`, that
//! runs the pipeline on a file already present on the server's filesystem.
//! All pipeline semantics live in [`crate::run::Orchestrator`]; this layer
//! only resolves the locator, maps errors to statuses, and serializes the
//! outcome. No authentication.

use crate::archive::pack_run_dir;
use crate::error::CatchwordError;
use crate::run::Orchestrator;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    path: String,
    #[serde(default)]
    archive: bool,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/process", get(process))
        .with_state(AppState { orchestrator })
}

/// Bind and serve until the process is stopped.
pub async fn serve(orchestrator: Arc<Orchestrator>, bind: &str) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = bind, "http surface listening");
    axum::serve(listener, router(orchestrator))
        .await
        .map_err(|e| CatchwordError::Other(format!("server error: {}", e)))
}

async fn process(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
) -> Response {
    let source = Path::new(&params.path);
    if !source.is_file() {
        return (
            StatusCode::BAD_REQUEST,
            format!("not a readable file: {}", params.path),
        )
            .into_response();
    }

    let outcome = match state.orchestrator.process_audio(source).await {
        Ok(outcome) => outcome,
        Err(e @ CatchwordError::InputUnreadable { .. }) => {
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
        Err(e) => {
            error!(error = %e, "run failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    if params.archive {
        let archive_path = match pack_run_dir(&outcome.run_dir) {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, "archive packing failed");
                return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
            }
        };
        return match tokio::fs::read(&archive_path).await {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/gzip")],
                bytes,
            )
                .into_response(),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        };
    }

    let body = serde_json::json!({
        "status": "done",
        "match": outcome.match_result.as_ref().map(|m| m.keyword.clone()),
        "score": outcome.match_result.as_ref().map(|m| m.score),
        "variant": outcome.match_result.as_ref().map(|m| m.variant.clone()),
        "backend": outcome.match_result.as_ref().map(|m| m.backend.clone()),
        "report": outcome.report_text,
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}
