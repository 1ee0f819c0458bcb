use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::{Education, Subject};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::EducationService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubjectRequest {
    #[serde(alias = "id")]
    pub subject_id: i64,
}

/// GET /api/education - every education level
pub async fn levels(State(state): State<AppState>) -> ApiResult<Vec<Education>> {
    let levels = EducationService::new(state.store.clone()).levels().await?;
    Ok(ApiResponse::success(levels))
}

/// GET /api/education/:edu - subjects of one level
pub async fn subjects(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Subject>> {
    let Path(level_id) = path?;
    let subjects = EducationService::new(state.store.clone()).subjects(level_id).await?;
    Ok(ApiResponse::success(subjects))
}

/// POST /api/user/education - link the caller to a subject; answers with its level
pub async fn assign(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<SubjectRequest>, JsonRejection>,
) -> ApiResult<Education> {
    let Json(request) = payload?;
    let level = EducationService::new(state.store.clone())
        .assign(user.user_id, request.subject_id)
        .await?;
    Ok(ApiResponse::created(level))
}

/// PUT /api/user/education - replace every link of the caller
pub async fn replace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<SubjectRequest>, JsonRejection>,
) -> ApiResult<Education> {
    let Json(request) = payload?;
    let level = EducationService::new(state.store.clone())
        .replace(user.user_id, request.subject_id)
        .await?;
    Ok(ApiResponse::success(level))
}

/// GET /api/user/education
pub async fn user_level(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Education> {
    let level = EducationService::new(state.store.clone()).user_level(user.user_id).await?;
    Ok(ApiResponse::success(level))
}

/// GET /api/user/subject
pub async fn user_subjects(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<Subject>> {
    let subjects = EducationService::new(state.store.clone()).user_subjects(user.user_id).await?;
    Ok(ApiResponse::success(subjects))
}
