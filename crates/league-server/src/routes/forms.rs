//! Form builder endpoints

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use league_forms::{
    DropdownOption, Field, FieldId, FieldPatch, FormTemplate, FormsError, Page, PageDraft, PageId, PagePatch,
    PrefillValue, SubmissionData, SubmissionId, TemplateDraft, TemplateId, TemplateIssue, TemplatePatch,
};
use serde_json::Value;

use super::{ok, ApiResult};
use crate::error::ApiError;
use crate::models::{Ack, ActiveBody, ConvertBody, FieldCreate, FormQuery, MoveBody, ReorderBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/:id", get(get_form).put(update_form).delete(delete_form))
        .route("/:id/active", put(set_active))
        .route("/:id/issues", get(form_issues))
        .route("/:id/fields", post(add_field))
        .route("/:id/field-order", put(reorder_fields))
        .route("/:id/fields/:field_id", put(update_field).delete(delete_field))
        .route("/:id/fields/:field_id/move", post(move_field))
        .route("/:id/fields/:field_id/options", get(dropdown_options))
        .route("/:id/fields/:field_id/prefill/:submission_id", get(prefill))
        .route("/:id/fields/:field_id/autofill", post(autofill))
        .route("/:id/multi-page", post(convert_to_multi_page))
        .route("/:id/single-page", post(convert_to_single_page))
        .route("/:id/pages", post(add_page))
        .route("/:id/pages/:page_id", put(update_page).delete(delete_page))
}

/// List templates, optionally the active ones in a category or display location
pub async fn list_forms(State(state): State<AppState>, Query(query): Query<FormQuery>) -> ApiResult<Vec<FormTemplate>> {
    let store = state.forms.templates();
    let templates = match (query.category_id, query.display_location) {
        (Some(category), _) => store.by_category(category),
        (None, Some(location)) => store.by_display_location(location),
        (None, None) => store.list(),
    };
    ok(templates)
}

pub async fn create_form(State(state): State<AppState>, Json(draft): Json<TemplateDraft>) -> ApiResult<FormTemplate> {
    if draft.name.trim().is_empty() {
        return Err(ApiError::BadRequest("form name is required".into()));
    }
    ok(state.forms.templates().create(draft))
}

pub async fn get_form(State(state): State<AppState>, Path(id): Path<TemplateId>) -> ApiResult<FormTemplate> {
    let template = state.forms.templates().get(id).ok_or(FormsError::TemplateNotFound(id))?;
    ok(template)
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(patch): Json<TemplatePatch>,
) -> ApiResult<FormTemplate> {
    ok(state.forms.templates().update(id, patch)?)
}

/// Submissions of a deleted template are kept
pub async fn delete_form(State(state): State<AppState>, Path(id): Path<TemplateId>) -> ApiResult<Ack> {
    if !state.forms.templates().delete(id) {
        return Err(FormsError::TemplateNotFound(id).into());
    }
    ok(Ack { ok: true })
}

pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(body): Json<ActiveBody>,
) -> ApiResult<FormTemplate> {
    ok(state.forms.templates().set_active(id, body.active)?)
}

pub async fn form_issues(State(state): State<AppState>, Path(id): Path<TemplateId>) -> ApiResult<Vec<TemplateIssue>> {
    ok(state.forms.templates().validate(id)?)
}

// ============ Fields ============

pub async fn add_field(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(body): Json<FieldCreate>,
) -> ApiResult<Field> {
    ok(state.forms.templates().add_field(id, body.page_id, body.field)?)
}

pub async fn update_field(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(TemplateId, FieldId)>,
    Json(patch): Json<FieldPatch>,
) -> ApiResult<Field> {
    ok(state.forms.templates().update_field(id, field_id, patch)?)
}

pub async fn delete_field(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(TemplateId, FieldId)>,
) -> ApiResult<Ack> {
    state.forms.templates().delete_field(id, field_id)?;
    ok(Ack { ok: true })
}

/// `ok: false` when the field is already at the edge of its page
pub async fn move_field(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(TemplateId, FieldId)>,
    Json(body): Json<MoveBody>,
) -> ApiResult<Ack> {
    let moved = state.forms.templates().move_field(id, field_id, body.direction)?;
    ok(Ack { ok: moved })
}

pub async fn reorder_fields(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(body): Json<ReorderBody>,
) -> ApiResult<FormTemplate> {
    let store = state.forms.templates();
    store.reorder_fields(id, body.page_id, &body.field_ids)?;
    ok(store.get(id).ok_or(FormsError::TemplateNotFound(id))?)
}

pub async fn dropdown_options(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(TemplateId, FieldId)>,
) -> ApiResult<Vec<DropdownOption>> {
    ok(state.forms.dropdown_options(id, field_id)?)
}

pub async fn prefill(
    State(state): State<AppState>,
    Path((id, field_id, submission_id)): Path<(TemplateId, FieldId, SubmissionId)>,
) -> ApiResult<Vec<PrefillValue>> {
    ok(state.forms.prefill(id, field_id, submission_id)?)
}

/// Autofill value for the form data entered so far; `null` when nothing is linked or selected
pub async fn autofill(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(TemplateId, FieldId)>,
    Json(data): Json<SubmissionData>,
) -> ApiResult<Option<Value>> {
    ok(state.forms.autofill(id, field_id, &data)?)
}

// ============ Pages ============

pub async fn convert_to_multi_page(State(state): State<AppState>, Path(id): Path<TemplateId>) -> ApiResult<FormTemplate> {
    ok(state.forms.templates().convert_to_multi_page(id)?)
}

pub async fn convert_to_single_page(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(body): Json<ConvertBody>,
) -> ApiResult<FormTemplate> {
    ok(state.forms.templates().convert_to_single_page(id, body.confirm)?)
}

pub async fn add_page(
    State(state): State<AppState>,
    Path(id): Path<TemplateId>,
    Json(draft): Json<PageDraft>,
) -> ApiResult<Page> {
    ok(state.forms.templates().add_page(id, draft)?)
}

pub async fn update_page(
    State(state): State<AppState>,
    Path((id, page_id)): Path<(TemplateId, PageId)>,
    Json(patch): Json<PagePatch>,
) -> ApiResult<Page> {
    ok(state.forms.templates().update_page(id, page_id, patch)?)
}

pub async fn delete_page(
    State(state): State<AppState>,
    Path((id, page_id)): Path<(TemplateId, PageId)>,
) -> ApiResult<Ack> {
    state.forms.templates().delete_page(id, page_id)?;
    ok(Ack { ok: true })
}
