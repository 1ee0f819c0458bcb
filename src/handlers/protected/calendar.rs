use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{CalendarPlanning, User};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::planning_service::PlanningInput;
use crate::services::PlanningService;
use crate::state::AppState;

/// Names the user to add or remove.
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub id: i64,
}

/// POST /api/calendar - create a planning; the caller becomes its first actor
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<PlanningInput>, JsonRejection>,
) -> ApiResult<CalendarPlanning> {
    let Json(input) = payload?;
    let planning = PlanningService::new(state.store.clone()).create(user.user_id, input).await?;
    Ok(ApiResponse::created(planning))
}

/// GET /api/calendar
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<CalendarPlanning>> {
    let plannings = PlanningService::new(state.store.clone()).list(user.user_id).await?;
    Ok(ApiResponse::success(plannings))
}

/// DELETE /api/calendar/:calendar_id - author only
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let Path(calendar_id) = path?;
    PlanningService::new(state.store.clone()).delete(user.user_id, calendar_id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/calendar/:calendar_id/actor - author only
pub async fn actor_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> ApiResult<Vec<User>> {
    let Path(calendar_id) = path?;
    let Json(actor) = payload?;

    let service = PlanningService::new(state.store.clone());
    service.add_actor(user.user_id, calendar_id, actor.id).await?;
    Ok(ApiResponse::created(service.actors(calendar_id).await?))
}

/// GET /api/calendar/:calendar_id/actor
pub async fn actor_list(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<User>> {
    let Path(calendar_id) = path?;
    let actors = PlanningService::new(state.store.clone()).actors(calendar_id).await?;
    Ok(ApiResponse::success(actors))
}

/// DELETE /api/calendar/:calendar_id/actor - author only
pub async fn actor_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Path(calendar_id) = path?;
    let Json(actor) = payload?;
    PlanningService::new(state.store.clone())
        .remove_actor(user.user_id, calendar_id, actor.id)
        .await?;
    Ok(ApiResponse::no_content())
}
