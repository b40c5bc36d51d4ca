// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers and router for the relay gate.
//!
//! Every route sits behind the [`AdmissionLayer`], so handlers only see
//! requests that were admitted.

use crate::client_ip::IdentifierSource;
use crate::files::{FileRecord, FileStore};
use crate::limiter::AdmissionController;
use crate::metrics::GateMetrics;
use crate::middleware::AdmissionLayer;
use crate::public_id;
use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared application state.
pub struct AppState {
    pub controller: Arc<AdmissionController>,
    pub identifiers: IdentifierSource,
    pub files: Arc<dyn FileStore>,
    pub metrics: Option<Arc<GateMetrics>>,
    pub health_token: Option<String>,
    pub started: Instant,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub tracked_clients: usize,
    pub files: usize,
}

/// Query string of a file pull.
#[derive(Debug, Deserialize)]
pub struct PullQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// File metadata returned by a pull.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub file_pub_id: String,
    pub filename: String,
    pub filesize: u64,
    pub filetype: String,
    pub filehash: String,
    pub creation_date: DateTime<Utc>,
    pub views: u64,
    pub downloads: u64,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            file_pub_id: record.pub_id,
            filename: record.meta.original_name,
            filesize: record.meta.size,
            filetype: record.meta.file_type,
            filehash: record.meta.hash,
            creation_date: record.creation_date,
            views: record.views,
            downloads: record.downloads,
        }
    }
}

fn error_response(status: StatusCode, code: &'static str, error: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code,
        }),
    )
        .into_response()
}

/// Build the service router.
pub fn router(state: Arc<AppState>, metrics_path: Option<&str>) -> Router {
    let layer = AdmissionLayer::new(state.controller.clone(), state.identifiers.clone());

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/v1/pull/f", get(pull_file));
    if let Some(path) = metrics_path {
        router = router.route(path, get(metrics));
    }

    router
        .layer(layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
///
/// When a token is configured the `Authorization` header must match it.
pub async fn health(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let ip = state
        .identifiers
        .identify(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    info!(ip = %ip, "Health check request");

    if let Some(expected) = &state.health_token {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if token != Some(expected.as_str()) {
            warn!(ip = %ip, "Health check token mismatch");
            return error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid health check token");
        }
    }

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
        tracked_clients: state.controller.len(),
        files: state.files.count(),
    })
    .into_response()
}

/// Return the metadata of a file by public ID.
pub async fn pull_file(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(query): Query<PullQuery>,
) -> Response {
    let ip = state
        .identifiers
        .identify(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let Some(id) = query.id.filter(|id| !id.is_empty()) else {
        warn!(ip = %ip, "Pull file request without id");
        return error_response(StatusCode::BAD_REQUEST, "MISSING_ID", "Missing id parameter");
    };

    if !public_id::validate(&id) {
        warn!(ip = %ip, id = %id, "Pull file request with malformed id");
        return error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "File not found");
    }

    match state.files.get(&id) {
        Some(record) => {
            debug!(ip = %ip, id = %id, "Pull file request served");
            Json(FileResponse::from(record)).into_response()
        }
        None => {
            warn!(ip = %ip, id = %id, "Pull file request for unknown id");
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", "File not found")
        }
    }
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
