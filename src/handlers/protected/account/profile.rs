use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::ProfileUpdate;
use crate::services::UserService;
use crate::state::AppState;

/// GET /api/profile
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<User> {
    let profile = UserService::new(state.store.clone()).get(user.user_id).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profile - partial update; unknown fields (status, email) are rejected
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<User> {
    let Json(update) = payload?;
    let profile = UserService::new(state.store.clone())
        .update_profile(user.user_id, update)
        .await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profile/active - finish onboarding
pub async fn activate(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<User> {
    let profile = UserService::new(state.store.clone()).activate(user.user_id).await?;
    Ok(ApiResponse::success(profile))
}
