use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Session, SessionService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/login - exchange email and password for a token pair
///
/// Checks the password against the most recent one on record. Unknown
/// emails and wrong passwords both answer 401 with the same message.
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(request) = payload?;

    let session = SessionService::new(state.store.clone(), state.tokens.clone())
        .login(&request.email, &request.password, state.config.security.bcrypt_cost)
        .await?;

    Ok(ApiResponse::success(session))
}
