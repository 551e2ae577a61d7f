//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use league_common::PasswordError;
use league_forms::FormsError;
use league_orders::OrderError;
use league_settings::SettingsError;
use league_teams::{PayoutError, TeamError};
use thiserror::Error;

use crate::models::ApiResponse;

/// Error returned by handlers, rendered in the standard envelope
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        let body = ApiResponse::<()>::error(self.code(), &self.to_string());
        (status, Json(body)).into_response()
    }
}

fn password_error(e: PasswordError) -> ApiError {
    match e {
        PasswordError::Empty => ApiError::BadRequest(e.to_string()),
        PasswordError::Hash(_) => ApiError::Internal(e.to_string()),
    }
}

impl From<FormsError> for ApiError {
    fn from(e: FormsError) -> Self {
        match e {
            FormsError::TemplateNotFound(_)
            | FormsError::FieldNotFound(_)
            | FormsError::PageNotFound(_)
            | FormsError::SubmissionNotFound(_)
            | FormsError::DesignNotFound(_) => Self::NotFound(e.to_string()),
            FormsError::Validation(_) | FormsError::NotUsable(_) => Self::BadRequest(e.to_string()),
            FormsError::Store(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::TemplateNotFound(_) => Self::NotFound(e.to_string()),
            SettingsError::Validation(_) => Self::BadRequest(e.to_string()),
            SettingsError::Password(inner) => password_error(inner),
            SettingsError::Persistence(_) | SettingsError::Mail(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<TeamError> for ApiError {
    fn from(e: TeamError) -> Self {
        match e {
            TeamError::TeamNotFound(_) | TeamError::PlayerNotFound { .. } => Self::NotFound(e.to_string()),
            TeamError::Validation(_) => Self::BadRequest(e.to_string()),
            TeamError::Password(inner) => password_error(inner),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) => Self::NotFound(e.to_string()),
            OrderError::Validation(_) => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<PayoutError> for ApiError {
    fn from(e: PayoutError) -> Self {
        match e {
            PayoutError::TeamNotFound(_) | PayoutError::NotFound(_) => Self::NotFound(e.to_string()),
            PayoutError::NoRevenue(_) => Self::BadRequest(e.to_string()),
            PayoutError::PendingExists { .. } | PayoutError::InvalidTransition { .. } => Self::Conflict(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(FormsError::TemplateNotFound(9)).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(FormsError::Validation("page required".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(PayoutError::PendingExists { team_id: 1, request_id: 2 }).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TeamError::Password(PasswordError::Empty)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(OrderError::NotFound(1000)).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_message_preserved() {
        let err = ApiError::from(SettingsError::TemplateNotFound("welcome".into()));
        assert_eq!(err.to_string(), "email template 'welcome' not found");
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
