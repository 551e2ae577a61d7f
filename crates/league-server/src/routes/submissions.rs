//! Submission endpoints

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use league_forms::{FormsError, ResolvedEntry, Submission, SubmissionFilter, SubmissionId};

use super::{ok, ApiResult};
use crate::error::ApiError;
use crate::models::{
    Ack, ApprovalBody, ApprovalResult, Notified, StatusBody, SubmissionCreate, SubmissionDataBody, SubmissionQuery,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_submissions).post(create_submission))
        .route(
            "/:id",
            get(get_submission).put(update_submission).delete(delete_submission),
        )
        .route("/:id/status", put(update_status))
        .route("/:id/approval", put(update_approval))
        .route("/:id/resolved", get(resolve_submission))
}

pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionQuery>,
) -> ApiResult<Vec<Submission>> {
    ok(state.forms.list(&SubmissionFilter { form_id: query.form_id }))
}

pub async fn create_submission(
    State(state): State<AppState>,
    Json(body): Json<SubmissionCreate>,
) -> ApiResult<Submission> {
    ok(state.forms.submit(body.form_id, body.data)?)
}

pub async fn get_submission(State(state): State<AppState>, Path(id): Path<SubmissionId>) -> ApiResult<Submission> {
    ok(state.forms.get(id).ok_or(FormsError::SubmissionNotFound(id))?)
}

pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<SubmissionId>,
    Json(body): Json<SubmissionDataBody>,
) -> ApiResult<Submission> {
    ok(state.forms.update_data(id, body.data)?)
}

pub async fn delete_submission(State(state): State<AppState>, Path(id): Path<SubmissionId>) -> ApiResult<Ack> {
    if !state.forms.delete(id) {
        return Err(FormsError::SubmissionNotFound(id).into());
    }
    ok(Ack { ok: true })
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<SubmissionId>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Submission> {
    ok(state.forms.update_status(id, body.status)?)
}

/// The status change is kept even when the email is not delivered
pub async fn update_approval(
    State(state): State<AppState>,
    Path(id): Path<SubmissionId>,
    Json(body): Json<ApprovalBody>,
) -> ApiResult<ApprovalResult> {
    let (record, notification) = state.forms.update_approval_status(id, body.approval_status).await?;
    ok(Notified { record, notification })
}

pub async fn resolve_submission(
    State(state): State<AppState>,
    Path(id): Path<SubmissionId>,
) -> ApiResult<Vec<ResolvedEntry>> {
    ok(state.forms.resolve(id)?)
}

/// CSV download of all submissions, or one form's with `?formId=`
pub async fn export_submissions(
    State(state): State<AppState>,
    Query(query): Query<SubmissionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let export = state.forms.export(query.form_id)?;
    tracing::info!(filename = %export.filename, "submissions exported");

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    ))
}
