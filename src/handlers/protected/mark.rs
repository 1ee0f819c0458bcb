use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};

use crate::database::models::UserMark;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::mark_service::{MarkAverage, MarkInput};
use crate::services::MarkService;
use crate::state::AppState;

/// POST /api/user_mark - rate another user from 0 to 5
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<MarkInput>, JsonRejection>,
) -> ApiResult<UserMark> {
    let Json(input) = payload?;
    let mark = MarkService::new(state.store.clone()).rate(user.user_id, input).await?;
    Ok(ApiResponse::created(mark))
}

/// GET /api/user_mark/:user_id - integer average of every mark received
pub async fn average(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<MarkAverage> {
    let Path(user_id) = path?;
    let average = MarkService::new(state.store.clone()).average(user_id).await?;
    Ok(ApiResponse::success(average))
}

/// GET /api/user_mark/comment - marks the caller has written
pub async fn authored(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<UserMark>> {
    let marks = MarkService::new(state.store.clone()).authored(user.user_id).await?;
    Ok(ApiResponse::success(marks))
}
