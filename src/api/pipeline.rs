//! Reconciled pipeline API: remote-first reads and dual-write updates.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::Value;

use crate::error::DealError;
use crate::fields;
use crate::services::pipeline::DualWriteReport;
use crate::state::AppState;
use crate::types::{DashboardData, Deal, DealInput, Sourced};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/pipeline/deals", get(list_deals).post(create_deal))
        .route(
            "/api/pipeline/deals/{id}",
            patch(update_deal).delete(delete_deal),
        )
        .route("/api/pipeline/dashboard", get(dashboard))
}

async fn list_deals(State(state): State<AppState>) -> Json<Sourced<Vec<Deal>>> {
    Json(state.pipeline.fetch_deals().await)
}

async fn dashboard(State(state): State<AppState>) -> Json<Sourced<DashboardData>> {
    Json(state.pipeline.dashboard().await)
}

async fn create_deal(
    State(state): State<AppState>,
    body: Result<Json<DealInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Deal>), DealError> {
    let Json(input) = body?;
    let deal = state.pipeline.create_deal(input)?;
    Ok((StatusCode::CREATED, Json(deal)))
}

/// The body is the record as the client last saw it plus the changed fields,
/// under either naming scheme. Its `origin` tag (or `createdAt`) decides
/// whether the local leg fires.
async fn update_deal(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DualWriteReport>, DealError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let record = body
        .as_object()
        .ok_or_else(|| DealError::Validation("request body must be a JSON object".into()))?;

    let origin = fields::detect_origin(record);
    let patch = fields::patch_from_record(record).map_err(DealError::Validation)?;
    let report = state.pipeline.update_deal(id, origin, patch).await?;
    Ok(Json(report))
}

async fn delete_deal(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, DealError> {
    let Path(id) = path?;
    state.pipeline.delete_deal(id)?;
    Ok(StatusCode::NO_CONTENT)
}
