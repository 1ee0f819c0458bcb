use axum::{
    extract::{rejection::PathRejection, Path, State},
    Extension,
};

use crate::database::models::{Code, User};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::CodeService;
use crate::state::AppState;

/// GET /api/code - latest verification code
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Code> {
    let code = CodeService::new(state.store.clone()).latest(user.user_id).await?;
    Ok(ApiResponse::success(code))
}

/// POST /api/code/send - issue a new code; status becomes at least unverified
pub async fn send(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Code> {
    let code = CodeService::new(state.store.clone()).resend(user.user_id).await?;
    Ok(ApiResponse::created(code))
}

/// POST /api/code/verification/:code - confirm the email address
///
/// Only the most recent code is accepted. On success the account moves to
/// status 2 (needs password) unless it is already further along.
pub async fn verify(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<User> {
    let Path(code) = path?;
    let user = CodeService::new(state.store.clone()).confirm(user.user_id, code).await?;
    Ok(ApiResponse::success(user))
}
