use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::{extract_bearer, Claims, TokenError};
use crate::database::models::{Role, UserStatus};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, as stated by a verified access token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub level: Role,
    pub status: UserStatus,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            level: claims.user_level,
            status: claims.user_status,
        }
    }
}

/// Rejects the request with 401 unless it carries a valid bearer token.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| TokenError::MalformedHeader)?),
        None => None,
    };

    let token = extract_bearer(header)?;
    let claims = state.tokens.parse_access_token(token)?;

    // Zero is never a store-assigned id
    if claims.user_id <= 0 {
        return Err(TokenError::InvalidToken.into());
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}
