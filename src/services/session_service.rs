use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{TokenError, TokenService};
use crate::database::{DatabaseError, Store};

use super::authorization_service::AuthorizationService;
use super::password_service::PasswordService;
use super::user_service::UserService;
use super::ServiceError;

/// Token pair handed out at login, registration, QR redemption and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub refresh_token: String,
}

pub struct SessionService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenService>,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Signs a fresh pair from the user's current status and stored level.
    pub async fn issue_for(&self, user_id: i64) -> Result<Session, ServiceError> {
        let user = UserService::new(self.store.clone()).get(user_id).await.map_err(|e| match e {
            ServiceError::Database(DatabaseError::NotFound(_)) => {
                ServiceError::Unauthorized("Account no longer exists".to_string())
            }
            other => other,
        })?;
        let authorization = AuthorizationService::new(self.store.clone()).find(user.id).await?;

        let token = self
            .tokens
            .issue_access_token(user.id, authorization.level, user.status)?;
        let refresh_token = self.tokens.issue_refresh_token(&self.tokens.refresh_claims(user.id))?;

        Ok(Session { token, refresh_token })
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str, bcrypt_cost: u32) -> Result<Session, ServiceError> {
        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

        let Some(user) = UserService::new(self.store.clone()).find_by_email(email).await? else {
            warn!("Login attempt for unknown email");
            return Err(invalid());
        };

        let passwords = PasswordService::new(self.store.clone(), bcrypt_cost);
        if !passwords.verify_latest(user.id, password).await? {
            warn!("Failed login for user {}", user.id);
            return Err(invalid());
        }

        info!("User {} logged in", user.id);
        self.issue_for(user.id).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, ServiceError> {
        let claims = self.tokens.parse_refresh_token(refresh_token)?;
        let user_id: i64 = claims.sub.parse().map_err(|_| TokenError::InvalidToken)?;
        self.issue_for(user_id).await
    }
}
