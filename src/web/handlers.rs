//! HTTP request handlers.

use super::AppState;
use crate::db::Target;
use crate::metrics::{self, FleetSummary, TargetSummary};
use crate::registry::RegistryError;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

/// Interval used when a create request omits one.
pub const DEFAULT_INTERVAL_SECS: u32 = 30;

/// A target together with its derived display values.
#[derive(Debug, Serialize)]
pub struct TargetView {
    #[serde(flatten)]
    pub target: Target,
    pub summary: TargetSummary,
}

impl From<Target> for TargetView {
    fn from(target: Target) -> Self {
        let summary = metrics::summarize(&target);
        Self { target, summary }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub fleet: FleetSummary,
    pub active_timers: usize,
}

fn error_response(err: RegistryError) -> Response {
    let status = match err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::Validation(_) => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string()).into_response()
}

fn target_response(result: Result<Target, RegistryError>) -> Response {
    match result {
        Ok(target) => Json(TargetView::from(target)).into_response(),
        Err(e) => error_response(e),
    }
}

// ============================================================================
// Status
// ============================================================================

pub async fn handle_health() -> &'static str {
    "ok"
}

pub async fn handle_summary(State(state): State<AppState>) -> impl IntoResponse {
    let targets = state.monitor.list_targets().await;
    let active_timers = state.monitor.active_timers().await.len();
    Json(SummaryResponse {
        fleet: metrics::fleet_summary(&targets),
        active_timers,
    })
}

// ============================================================================
// API: Targets
// ============================================================================

pub async fn handle_list_targets(State(state): State<AppState>) -> impl IntoResponse {
    let views: Vec<TargetView> = state
        .monitor
        .list_targets()
        .await
        .into_iter()
        .map(TargetView::from)
        .collect();
    Json(views)
}

pub async fn handle_get_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.monitor.get_target(&id).await {
        Some(target) => Json(TargetView::from(target)).into_response(),
        None => error_response(RegistryError::NotFound(id)),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTargetRequest {
    pub name: String,
    pub url: String,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_SECS
}

pub async fn handle_create_target(
    State(state): State<AppState>,
    Json(req): Json<CreateTargetRequest>,
) -> Response {
    match state
        .monitor
        .create_target(&req.name, &req.url, req.interval)
        .await
    {
        Ok(target) => (StatusCode::CREATED, Json(TargetView::from(target))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_delete_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.monitor.delete_target(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

pub async fn handle_set_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetActiveRequest>,
) -> Response {
    target_response(state.monitor.set_active(&id, req.active).await)
}

pub async fn handle_toggle_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    target_response(state.monitor.toggle_target(&id).await)
}

#[derive(Debug, Deserialize)]
pub struct SetIntervalRequest {
    pub interval: u32,
}

pub async fn handle_set_interval(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetIntervalRequest>,
) -> Response {
    target_response(state.monitor.set_interval(&id, req.interval).await)
}
