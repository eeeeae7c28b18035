//! HTTP handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use paral_core::wire::{
    CalculateRequest, CalculateResponse, ExpressionResponse, ExpressionsResponse, ResultResponse,
    TaskResponse,
};
use paral_core::{ExpressionId, TaskReport};
use serde::Serialize;
use tracing::debug;

use crate::error::{OrchestratorError, Result};
use crate::service::Orchestrator;

/// Shared handler state.
pub type AppState = Arc<Orchestrator>;

/// Liveness probe body.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /api/v1/calculate`: 201 with the new id, 422 when the text does not compile.
pub async fn calculate(
    State(state): State<AppState>,
    body: std::result::Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CalculateResponse>)> {
    let Json(request) = body?;
    let id = state.add_expression(&request.expression).await?;
    Ok((StatusCode::CREATED, Json(CalculateResponse { id })))
}

/// `GET /api/v1/expressions`: every expression in submission order.
pub async fn list_expressions(State(state): State<AppState>) -> Result<Json<ExpressionsResponse>> {
    let expressions = state.list_expressions().await?;
    Ok(Json(ExpressionsResponse { expressions }))
}

/// `GET /api/v1/expressions/{id}`: 400 for a malformed id, 404 for an unknown one.
pub async fn get_expression(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExpressionResponse>> {
    let id: ExpressionId = id
        .parse()
        .map_err(|_| OrchestratorError::InvalidId(id.clone()))?;
    let expression = state.get_expression(id).await?;
    Ok(Json(ExpressionResponse { expression }))
}

/// `GET /internal/task`: leases one runnable task, 404 when none is ready.
pub async fn next_task(State(state): State<AppState>) -> Result<Json<TaskResponse>> {
    match state.get_pending_task().await? {
        Some(task) => {
            debug!(task_id = %task.id, "leased task");
            Ok(Json(TaskResponse { task }))
        }
        None => Err(OrchestratorError::NotFound("no task available".to_string())),
    }
}

/// `POST /internal/task/result`: 404 unknown task, 409 already terminal,
/// 422 for an unrecognised status.
pub async fn submit_result(
    State(state): State<AppState>,
    body: std::result::Result<Json<TaskReport>, JsonRejection>,
) -> Result<Json<ResultResponse>> {
    let Json(report) = body?;
    let expression_status = state.submit_task_result(report).await?;
    Ok(Json(ResultResponse { expression_status }))
}
