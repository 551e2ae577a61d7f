//! Admin settings endpoints

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use league_settings::{
    EmailTemplate, EmailTemplatePatch, OutgoingEmail, Placeholders, SettingsError, SettingsPatch, SettingsView,
    TeamPortalTemplate, TeamPortalTemplatePatch, PLACEHOLDERS,
};
use std::collections::HashMap;

use super::{ok, ApiResult};
use crate::error::ApiError;
use crate::models::{Ack, EmailBody, LoginResult, PasswordBody, Recipient, TemplateSend};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .route("/admin-email", put(update_admin_email))
        .route("/admin-password", put(update_admin_password))
        .route("/admin-login", post(admin_login))
        .route("/supplier-email", put(update_supplier_email))
        .route("/team-portal-template", put(update_team_portal_template))
        .route("/placeholders", get(list_placeholders))
        .route("/email-templates/:key", get(get_email_template).put(update_email_template))
        .route("/email-templates/:key/preview", post(preview_email_template))
        .route("/email-templates/:key/send", post(send_email_template))
}

/// Current settings, re-read from disk, without the password hash
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<SettingsView> {
    ok(state.settings.snapshot().view())
}

pub async fn update_settings(State(state): State<AppState>, Json(patch): Json<SettingsPatch>) -> ApiResult<SettingsView> {
    ok(state.settings.update_all(patch)?.view())
}

pub async fn update_admin_email(State(state): State<AppState>, Json(body): Json<EmailBody>) -> ApiResult<SettingsView> {
    ok(state.settings.update_admin_email(&body.email)?.view())
}

pub async fn update_admin_password(State(state): State<AppState>, Json(body): Json<PasswordBody>) -> ApiResult<Ack> {
    state.settings.update_admin_password(&body.password)?;
    ok(Ack { ok: true })
}

pub async fn admin_login(State(state): State<AppState>, Json(body): Json<PasswordBody>) -> ApiResult<LoginResult> {
    if !state.settings.verify_admin_password(&body.password) {
        tracing::warn!("admin login failed");
        return Err(ApiError::Unauthorized("invalid admin password".into()));
    }
    ok(LoginResult { authenticated: true })
}

pub async fn update_supplier_email(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> ApiResult<SettingsView> {
    ok(state.settings.update_supplier_email(&body.email)?.view())
}

pub async fn update_team_portal_template(
    State(state): State<AppState>,
    Json(patch): Json<TeamPortalTemplatePatch>,
) -> ApiResult<TeamPortalTemplate> {
    ok(state.settings.update_team_portal_template(patch)?)
}

pub async fn list_placeholders() -> ApiResult<Vec<&'static str>> {
    ok(PLACEHOLDERS.to_vec())
}

pub async fn get_email_template(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<EmailTemplate> {
    let template = state
        .settings
        .get_email_template(&key)
        .ok_or(SettingsError::TemplateNotFound(key))?;
    ok(template)
}

pub async fn update_email_template(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(patch): Json<EmailTemplatePatch>,
) -> ApiResult<EmailTemplate> {
    ok(state.settings.update_email_template(&key, patch)?)
}

/// Render a template with sample values, without sending it
pub async fn preview_email_template(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<TemplateSend>,
) -> ApiResult<OutgoingEmail> {
    let to = recipient_address(&state, &body)?;
    ok(state.email.compose(&key, &to, &placeholders(&body.values))?)
}

/// Send a rendered template, for checking mail settings
pub async fn send_email_template(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<TemplateSend>,
) -> ApiResult<Ack> {
    let values = placeholders(&body.values);
    match body.recipient {
        Recipient::Admin => state.email.notify_admin(&key, &values).await?,
        Recipient::Supplier => state.email.notify_supplier(&key, &values).await?,
        Recipient::Address => {
            let to = recipient_address(&state, &body)?;
            state.email.send_template(&key, &to, &values).await?
        }
    }
    ok(Ack { ok: true })
}

fn recipient_address(state: &AppState, body: &TemplateSend) -> Result<String, ApiError> {
    match body.recipient {
        Recipient::Admin => Ok(state.settings.admin_email()),
        Recipient::Supplier => Ok(state.settings.supplier_email()),
        Recipient::Address => body
            .to
            .clone()
            .filter(|to| !to.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("recipient address is required".into())),
    }
}

fn placeholders(values: &HashMap<String, String>) -> Placeholders {
    let mut placeholders = Placeholders::new();
    for (name, value) in values {
        placeholders.set(name, value.clone());
    }
    placeholders
}
