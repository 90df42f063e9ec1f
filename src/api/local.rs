//! Local REST API over the in-memory store.
//!
//! These routes never touch the webhook source.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use serde::Serialize;

use crate::error::DealError;
use crate::state::AppState;
use crate::types::{DashboardData, Deal, DealInput, DealPatch};
use crate::vocabulary::{loader::get_available_vocabularies, Vocabulary};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/deals", get(list_deals).post(create_deal))
        .route(
            "/api/deals/{id}",
            get(get_deal).patch(update_deal).delete(delete_deal),
        )
        .route("/api/dashboard", get(dashboard))
        .route("/api/vocabulary", get(active_vocabulary))
        .route("/api/vocabularies", get(list_vocabularies))
}

async fn list_deals(State(state): State<AppState>) -> Json<Vec<Deal>> {
    Json(state.pipeline.local_deals())
}

async fn get_deal(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Deal>, DealError> {
    let Path(id) = path?;
    state.pipeline.local_deal(id).map(Json)
}

async fn create_deal(
    State(state): State<AppState>,
    body: Result<Json<DealInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Deal>), DealError> {
    let Json(input) = body?;
    let deal = state.pipeline.create_deal(input)?;
    Ok((StatusCode::CREATED, Json(deal)))
}

async fn update_deal(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<DealPatch>, JsonRejection>,
) -> Result<Json<Deal>, DealError> {
    let Path(id) = path?;
    let Json(patch) = body?;
    state.pipeline.local_update(id, patch).map(Json)
}

async fn delete_deal(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, DealError> {
    let Path(id) = path?;
    state.pipeline.delete_deal(id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardData> {
    Json(state.pipeline.local_dashboard())
}

/// Stage and status labels the service currently accepts.
async fn active_vocabulary(State(state): State<AppState>) -> Json<Vocabulary> {
    Json(state.pipeline.vocabulary().clone())
}

#[derive(Serialize)]
struct VocabularySummary {
    id: String,
    name: String,
    description: String,
}

async fn list_vocabularies() -> Json<Vec<VocabularySummary>> {
    Json(
        get_available_vocabularies()
            .into_iter()
            .map(|(id, name, description)| VocabularySummary {
                id,
                name,
                description,
            })
            .collect(),
    )
}
