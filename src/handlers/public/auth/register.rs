use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::Serialize;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::Registration;
use crate::services::validate::parse_role;
use crate::services::{Session, SessionService, UserService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    #[serde(flatten)]
    pub session: Session,
    pub user: User,
}

/// POST /api/register/:as - create an account
///
/// `:as` is the authorization level: 0 student, 1 parent, 2 tutor, 3 professor.
///
/// ```json
/// { "email": "a@b.com", "name": "optional", "family_name": "optional", "nick_name": "optional" }
/// ```
///
/// Answers 201 with `{token, refresh_token, user}`. The account starts in
/// status 0 (new) and a first verification code is issued.
pub async fn post(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<RegistrationResponse> {
    let Path(level) = path?;
    let level = parse_role(&level)?;
    let Json(registration) = payload?;

    register(&state, level, registration).await
}

/// POST /api/register/:as/:email - same as above with the email in the path
pub async fn post_with_email(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult<RegistrationResponse> {
    let Path((level, email)) = path?;
    let level = parse_role(&level)?;

    let registration = Registration {
        email,
        ..Default::default()
    };
    register(&state, level, registration).await
}

async fn register(
    state: &AppState,
    level: crate::database::models::Role,
    registration: Registration,
) -> ApiResult<RegistrationResponse> {
    let user = UserService::new(state.store.clone()).register(level, registration).await?;
    let session = SessionService::new(state.store.clone(), state.tokens.clone())
        .issue_for(user.id)
        .await?;

    Ok(ApiResponse::created(RegistrationResponse { session, user }))
}
