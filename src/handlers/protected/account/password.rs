use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{PasswordRecord, User};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::PasswordService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

fn service(state: &AppState) -> PasswordService {
    PasswordService::new(state.store.clone(), state.config.security.bcrypt_cost)
}

/// POST /api/password - set a new password (1 to 18 characters)
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PasswordRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(request) = payload?;
    let user = service(&state).set_password(user.user_id, &request.password).await?;
    Ok(ApiResponse::success(user))
}

/// GET /api/password/history - when each password was set, newest first
pub async fn history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<PasswordRecord>> {
    let history = service(&state).history(user.user_id).await?;
    Ok(ApiResponse::success(history))
}
