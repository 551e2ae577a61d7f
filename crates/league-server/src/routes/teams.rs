//! Team portal endpoints
//!
//! Profiles, rosters, messages and the revenue ledger. Team payout requests
//! are created here and managed under `/api/payouts`.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use league_forms::{FieldReader, FormsError, NotificationOutcome, Submission, SubmissionId};
use league_teams::{
    BankingDetails, DocumentDraft, Fixture, FixtureDraft, KitPricing, NewTeam, Payment, PaymentDraft, PayoutRequest,
    Player, PlayerDraft, RevenueEntry, Team, TeamDocument, TeamDraft, TeamError, TeamId, TeamMessage,
    TeamProfilePatch, TeamStats,
};

use super::{ok, ApiResult};
use crate::error::ApiError;
use crate::models::{
    Ack, CommissionRevenue, EmailBody, MarkupRevenue, MessageBody, Notified, PasswordBody, PayoutRequested,
    PlayerCredit, RevenueSummary, SubTeamBody, TeamLogin, TeamLookup, TeamStatusBody,
};
use crate::notify;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/lookup", get(lookup_team))
        .route("/from-submission/:submission_id", post(create_from_submission))
        .route("/:id", get(get_team).delete(delete_team))
        .route("/:id/profile", put(update_profile))
        .route("/:id/password", put(update_password))
        .route("/:id/email", put(update_email))
        .route("/:id/banking", put(update_banking_details))
        .route("/:id/status", put(update_status))
        .route("/:id/players", post(add_player))
        .route("/:id/players/:player_id", delete(remove_player))
        .route("/:id/players/:player_id/move", post(move_player))
        .route("/:id/players/:player_id/duplicate", post(duplicate_player))
        .route("/:id/documents", post(add_document))
        .route("/:id/messages", post(add_message))
        .route("/:id/messages/unread", get(unread_count))
        .route("/:id/messages/:message_id/read", put(mark_message_read))
        .route("/:id/fixtures", post(add_fixture))
        .route("/:id/payments", post(add_payment))
        .route("/:id/revenue", get(team_revenue))
        .route("/:id/revenue/markup", post(add_markup_revenue))
        .route("/:id/revenue/commission", post(add_commission_revenue))
        .route("/:id/payouts", get(team_payouts).post(request_payout))
}

pub fn kit_pricing_router() -> Router<AppState> {
    Router::new().route(
        "/:submission_id",
        get(get_kit_pricing).put(set_kit_pricing).delete(reset_kit_pricing),
    )
}

// ============ Profiles ============

pub async fn list_teams(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    ok(state.teams.list())
}

/// The temporary password is returned once and never stored in clear
pub async fn create_team(State(state): State<AppState>, Json(draft): Json<TeamDraft>) -> ApiResult<NewTeam> {
    ok(state.teams.create(draft)?)
}

fn find_submission(state: &AppState, id: SubmissionId) -> Result<Submission, ApiError> {
    Ok(state.forms.get(id).ok_or(FormsError::SubmissionNotFound(id))?)
}

/// Create the profile for an approved team registration, reading the
/// registration through its form's field labels
pub async fn create_from_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<SubmissionId>,
) -> ApiResult<NewTeam> {
    let submission = find_submission(&state, submission_id)?;
    let template = state.forms.templates().get(submission.form_id);
    let data = FieldReader::new(template.as_ref(), &submission.data).labelled();
    ok(state.teams.create_from_submission(submission_id, &data)?)
}

/// Find a team by email, name or registration submission
pub async fn lookup_team(State(state): State<AppState>, Query(query): Query<TeamLookup>) -> ApiResult<Team> {
    let team = if let Some(email) = &query.email {
        state.teams.by_email(email)
    } else if let Some(name) = &query.name {
        state.teams.by_name(name)
    } else if let Some(submission_id) = query.submission_id {
        state.teams.by_submission(submission_id)
    } else {
        return Err(ApiError::BadRequest("email, name or submissionId is required".into()));
    };
    ok(team.ok_or_else(|| ApiError::NotFound("no matching team".into()))?)
}

pub async fn get_team(State(state): State<AppState>, Path(id): Path<TeamId>) -> ApiResult<Team> {
    ok(state.teams.get(id).ok_or(TeamError::TeamNotFound(id))?)
}

pub async fn delete_team(State(state): State<AppState>, Path(id): Path<TeamId>) -> ApiResult<Ack> {
    if !state.teams.delete(id) {
        return Err(TeamError::TeamNotFound(id).into());
    }
    ok(Ack { ok: true })
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(patch): Json<TeamProfilePatch>,
) -> ApiResult<Team> {
    ok(state.teams.update_profile(id, patch)?)
}

pub async fn update_password(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(body): Json<PasswordBody>,
) -> ApiResult<Ack> {
    state.teams.update_password(id, &body.password)?;
    ok(Ack { ok: true })
}

pub async fn update_email(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(body): Json<EmailBody>,
) -> ApiResult<Team> {
    ok(state.teams.update_email(id, &body.email)?)
}

pub async fn update_banking_details(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(details): Json<BankingDetails>,
) -> ApiResult<Team> {
    ok(state.teams.update_banking_details(id, details)?)
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(body): Json<TeamStatusBody>,
) -> ApiResult<Team> {
    ok(state.teams.update_status(id, body.status)?)
}

pub async fn team_stats(State(state): State<AppState>) -> ApiResult<TeamStats> {
    ok(state.teams.stats())
}

/// Team portal sign-in by email or team name
pub async fn team_login(State(state): State<AppState>, Json(body): Json<TeamLogin>) -> ApiResult<Team> {
    match state.teams.verify_credentials(&body.identifier, &body.password) {
        Some(team) => ok(team),
        None => {
            tracing::warn!(identifier = %body.identifier, "team login failed");
            Err(ApiError::Unauthorized("invalid team credentials".into()))
        }
    }
}

// ============ Roster ============

pub async fn add_player(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(draft): Json<PlayerDraft>,
) -> ApiResult<Player> {
    ok(state.teams.add_player(id, draft)?)
}

pub async fn remove_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(TeamId, u64)>,
) -> ApiResult<Ack> {
    if !state.teams.remove_player(id, player_id)? {
        return Err(TeamError::PlayerNotFound { team_id: id, player_id }.into());
    }
    ok(Ack { ok: true })
}

pub async fn move_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(TeamId, u64)>,
    Json(body): Json<SubTeamBody>,
) -> ApiResult<Player> {
    ok(state.teams.move_player(id, player_id, &body.sub_team)?)
}

pub async fn duplicate_player(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(TeamId, u64)>,
    Json(body): Json<SubTeamBody>,
) -> ApiResult<Player> {
    ok(state.teams.duplicate_player(id, player_id, &body.sub_team)?)
}

// ============ Documents, messages, fixtures, payments ============

pub async fn add_document(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(draft): Json<DocumentDraft>,
) -> ApiResult<TeamDocument> {
    ok(state.teams.add_document(id, draft)?)
}

pub async fn add_message(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(body): Json<MessageBody>,
) -> ApiResult<TeamMessage> {
    ok(state.teams.add_message(id, &body.message, body.from_admin)?)
}

pub async fn unread_count(State(state): State<AppState>, Path(id): Path<TeamId>) -> ApiResult<usize> {
    if state.teams.get(id).is_none() {
        return Err(TeamError::TeamNotFound(id).into());
    }
    ok(state.teams.unread_count(id))
}

pub async fn mark_message_read(
    State(state): State<AppState>,
    Path((id, message_id)): Path<(TeamId, u64)>,
) -> ApiResult<Ack> {
    let found = state.teams.mark_message_read(id, message_id)?;
    if !found {
        return Err(ApiError::NotFound(format!("message {} not found", message_id)));
    }
    ok(Ack { ok: true })
}

pub async fn add_fixture(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(draft): Json<FixtureDraft>,
) -> ApiResult<Fixture> {
    ok(state.teams.add_fixture(id, draft)?)
}

pub async fn add_payment(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(draft): Json<PaymentDraft>,
) -> ApiResult<Payment> {
    ok(state.teams.add_payment(id, draft)?)
}

// ============ Revenue ============

pub async fn team_revenue(State(state): State<AppState>, Path(id): Path<TeamId>) -> ApiResult<RevenueSummary> {
    if state.teams.get(id).is_none() {
        return Err(TeamError::TeamNotFound(id).into());
    }
    ok(RevenueSummary {
        entries: state.teams.revenue(id),
        breakdown: state.teams.revenue_breakdown(id),
    })
}

pub async fn add_markup_revenue(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(body): Json<MarkupRevenue>,
) -> ApiResult<RevenueEntry> {
    ok(state
        .teams
        .add_player_registration_revenue(id, &body.player_name, body.markup, body.submission_id)?)
}

pub async fn add_commission_revenue(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(body): Json<CommissionRevenue>,
) -> ApiResult<RevenueEntry> {
    ok(state
        .teams
        .add_product_commission(id, &body.customer_name, body.order_total, &body.order_number)?)
}

/// Credit the kit markup of a player registration to the player's main team;
/// `null` while that team is on a zero markup
pub async fn credit_player_registration(
    State(state): State<AppState>,
    Path(submission_id): Path<SubmissionId>,
    Json(body): Json<PlayerCredit>,
) -> ApiResult<Option<RevenueEntry>> {
    let submission = find_submission(&state, submission_id)?;
    let template = state.forms.templates().get(submission.form_id);
    let picked = FieldReader::new(template.as_ref(), &submission.data).linked_submissions();
    let team_id = state
        .teams
        .main_team_for_player(&picked)
        .ok_or_else(|| ApiError::BadRequest("registration does not select a known team".into()))?;
    let team = state.teams.get(team_id).ok_or(TeamError::TeamNotFound(team_id))?;
    let pricing = team
        .form_submission_id
        .map(|id| state.kit_pricing.get(id))
        .unwrap_or_default();

    ok(state
        .teams
        .credit_registration_markup(team_id, &body.player_name, pricing.markup, Some(submission_id))?)
}

// ============ Payouts ============

pub async fn team_payouts(State(state): State<AppState>, Path(id): Path<TeamId>) -> ApiResult<Vec<PayoutRequest>> {
    if state.teams.get(id).is_none() {
        return Err(TeamError::TeamNotFound(id).into());
    }
    ok(state.teams.payouts_for_team(id))
}

/// Request a payout of the team's full balance and alert the admin
pub async fn request_payout(State(state): State<AppState>, Path(id): Path<TeamId>) -> ApiResult<PayoutRequested> {
    let request = state.teams.create_payout_request(id)?;
    let notification = if state.config.mail.enabled {
        notify::payout_requested(&state.email, &request, &state.config.base_url).await
    } else {
        NotificationOutcome::Skipped("mail disabled".into())
    };
    ok(Notified { record: request, notification })
}

// ============ Kit pricing ============

pub async fn get_kit_pricing(
    State(state): State<AppState>,
    Path(submission_id): Path<SubmissionId>,
) -> ApiResult<KitPricing> {
    ok(state.kit_pricing.get(submission_id))
}

pub async fn set_kit_pricing(
    State(state): State<AppState>,
    Path(submission_id): Path<SubmissionId>,
    Json(pricing): Json<KitPricing>,
) -> ApiResult<KitPricing> {
    ok(state.kit_pricing.set(submission_id, pricing)?)
}

/// `ok: false` when the team was already on the default pricing
pub async fn reset_kit_pricing(
    State(state): State<AppState>,
    Path(submission_id): Path<SubmissionId>,
) -> ApiResult<Ack> {
    ok(Ack { ok: state.kit_pricing.reset(submission_id) })
}
