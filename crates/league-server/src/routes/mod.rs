//! API Routes

pub mod designs;
pub mod forms;
pub mod health;
pub mod orders;
pub mod payouts;
pub mod settings;
pub mod submissions;
pub mod teams;

use axum::Json;

use crate::error::ApiError;
use crate::models::ApiResponse;

/// Handler result in the standard envelope
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}
