use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{Session, SessionService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/token/refresh - trade a refresh token for a fresh pair
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Session> {
    let Json(request) = payload?;

    let session = SessionService::new(state.store.clone(), state.tokens.clone())
        .refresh(&request.refresh_token)
        .await?;

    Ok(ApiResponse::success(session))
}
