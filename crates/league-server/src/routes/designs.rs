//! Kit design library endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use league_forms::{Design, DesignDraft, DesignPatch, FormsError};

use super::{ok, ApiResult};
use crate::error::ApiError;
use crate::models::{Ack, DesignQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_designs).post(add_design))
        .route("/reload", post(reload_designs))
        .route("/:id", get(get_design).put(update_design).delete(delete_design))
        .route("/:id/toggle", post(toggle_design))
}

pub async fn list_designs(State(state): State<AppState>, Query(query): Query<DesignQuery>) -> ApiResult<Vec<Design>> {
    ok(state.designs.list(query.active_only))
}

pub async fn get_design(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Design> {
    ok(state.designs.get(id).ok_or(FormsError::DesignNotFound(id))?)
}

pub async fn add_design(State(state): State<AppState>, Json(draft): Json<DesignDraft>) -> ApiResult<Design> {
    if draft.name.trim().is_empty() {
        return Err(ApiError::BadRequest("design name is required".into()));
    }
    ok(state.designs.add(draft)?)
}

pub async fn update_design(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<DesignPatch>,
) -> ApiResult<Design> {
    ok(state.designs.update(id, patch)?)
}

pub async fn toggle_design(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Design> {
    ok(state.designs.toggle_active(id)?)
}

pub async fn delete_design(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Ack> {
    if !state.designs.delete(id)? {
        return Err(FormsError::DesignNotFound(id).into());
    }
    ok(Ack { ok: true })
}

/// Pick up edits made to the library file by hand
pub async fn reload_designs(State(state): State<AppState>) -> ApiResult<Vec<Design>> {
    state.designs.reload();
    ok(state.designs.list(false))
}
