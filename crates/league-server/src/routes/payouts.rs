//! Admin payout workflow endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use league_teams::{PayoutError, PayoutId, PayoutRequest};

use super::{ok, ApiResult};
use crate::models::{PayoutDecision, PayoutProcess, PayoutQuery};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payouts))
        .route("/:id", get(get_payout))
        .route("/:id/approve", post(approve_payout))
        .route("/:id/reject", post(reject_payout))
        .route("/:id/process", post(process_payout))
}

/// Newest first; `?pending=true` for the review queue
pub async fn list_payouts(State(state): State<AppState>, Query(query): Query<PayoutQuery>) -> ApiResult<Vec<PayoutRequest>> {
    if query.pending {
        ok(state.teams.pending_payouts())
    } else {
        ok(state.teams.payouts())
    }
}

pub async fn get_payout(State(state): State<AppState>, Path(id): Path<PayoutId>) -> ApiResult<PayoutRequest> {
    ok(state.teams.payout(id).ok_or(PayoutError::NotFound(id))?)
}

pub async fn approve_payout(
    State(state): State<AppState>,
    Path(id): Path<PayoutId>,
    Json(body): Json<PayoutDecision>,
) -> ApiResult<PayoutRequest> {
    ok(state.teams.approve_payout(id, &body.notes)?)
}

pub async fn reject_payout(
    State(state): State<AppState>,
    Path(id): Path<PayoutId>,
    Json(body): Json<PayoutDecision>,
) -> ApiResult<PayoutRequest> {
    ok(state.teams.reject_payout(id, &body.notes)?)
}

/// Mark paid and clear the team's ledger per `scope` (everything by default)
pub async fn process_payout(
    State(state): State<AppState>,
    Path(id): Path<PayoutId>,
    Json(body): Json<PayoutProcess>,
) -> ApiResult<PayoutRequest> {
    ok(state.teams.process_payout(id, &body.notes, body.scope)?)
}
