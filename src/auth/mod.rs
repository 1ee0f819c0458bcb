//! Signed session tokens.
//!
//! Access tokens carry `{user_id, user_level, user_status}` on top of the
//! registered claims; refresh tokens carry the registered claims only. Both are
//! HS256 and are told apart by audience.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::SecurityConfig;
use crate::database::models::{Role, UserStatus};

const ACCESS_AUDIENCE: &str = "access";
const REFRESH_AUDIENCE: &str = "refresh";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token signing failed: {0}")]
    SigningFailure(String),
}

/// Standard claim set shared by both token kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub user_level: Role,
    pub user_status: UserStatus,
    #[serde(flatten)]
    pub registered: RegisteredClaims,
}

/// Issues and verifies tokens with one symmetric key.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, issuer: impl Into<String>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(
            &security.jwt_secret,
            security.jwt_issuer.clone(),
            Duration::hours(security.access_ttl_hours),
            Duration::hours(security.refresh_ttl_hours),
        )
    }

    /// Registered claims for a refresh token bound to `user_id`, starting now.
    pub fn refresh_claims(&self, user_id: i64) -> RegisteredClaims {
        self.registered(user_id, REFRESH_AUDIENCE, self.refresh_ttl)
    }

    fn registered(&self, user_id: i64, audience: &str, ttl: Duration) -> RegisteredClaims {
        let now = Utc::now();
        RegisteredClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            aud: audience.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn issue_access_token(
        &self,
        user_id: i64,
        level: Role,
        status: UserStatus,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            user_id,
            user_level: level,
            user_status: status,
            registered: self.registered(user_id, ACCESS_AUDIENCE, self.access_ttl),
        };
        self.sign(&claims)
    }

    pub fn issue_refresh_token(&self, claims: &RegisteredClaims) -> Result<String, TokenError> {
        self.sign(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::SigningFailure(e.to_string()))
    }

    pub fn parse_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(token, ACCESS_AUDIENCE)
    }

    pub fn parse_refresh_token(&self, token: &str) -> Result<RegisteredClaims, TokenError> {
        self.verify(token, REFRESH_AUDIENCE)
    }

    fn verify<T: serde::de::DeserializeOwned>(&self, token: &str, audience: &str) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);

        decode::<T>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("token rejected: {}", e);
                TokenError::InvalidToken
            })
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` value.
///
/// The value must split on single spaces into exactly two parts.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, TokenError> {
    let value = match header {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Err(TokenError::MissingHeader),
    };

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(TokenError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", "duval", Duration::hours(1), Duration::hours(24))
    }

    fn tamper(token: &str) -> String {
        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<char> = sig.chars().collect();
        sig[0] = if sig[0] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, sig.into_iter().collect::<String>())
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service();
        let token = tokens.issue_access_token(7, Role::Tutor, UserStatus::Active).unwrap();
        let claims = tokens.parse_access_token(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.user_level.code(), 2);
        assert_eq!(claims.user_status.code(), 4);
        assert_eq!(claims.registered.iss, "duval");
        assert_eq!(claims.registered.sub, "7");
        assert!(claims.registered.exp > claims.registered.iat);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = service();
        let token = tokens.issue_access_token(7, Role::Tutor, UserStatus::Active).unwrap();
        assert_eq!(tokens.parse_access_token(&tamper(&token)), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_foreign_secret_is_rejected() {
        let other = TokenService::new("other-secret", "duval", Duration::hours(1), Duration::hours(1));
        let token = other.issue_access_token(1, Role::Student, UserStatus::New).unwrap();
        assert_eq!(service().parse_access_token(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let other = TokenService::new("test-secret", "someone-else", Duration::hours(1), Duration::hours(1));
        let token = other.issue_access_token(1, Role::Student, UserStatus::New).unwrap();
        assert_eq!(service().parse_access_token(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let expired = TokenService::new("test-secret", "duval", Duration::hours(-2), Duration::hours(-2));
        let token = expired.issue_access_token(1, Role::Student, UserStatus::New).unwrap();
        assert_eq!(service().parse_access_token(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(service().parse_access_token("abc.def.ghi"), Err(TokenError::InvalidToken));
        assert_eq!(service().parse_access_token(""), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let tokens = service();
        let registered = tokens.refresh_claims(42);
        let token = tokens.issue_refresh_token(&registered).unwrap();
        assert_eq!(tokens.parse_refresh_token(&token).unwrap(), registered);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let tokens = service();
        let access = tokens.issue_access_token(3, Role::Parent, UserStatus::New).unwrap();
        let refresh = tokens.issue_refresh_token(&tokens.refresh_claims(3)).unwrap();
        assert_eq!(tokens.parse_refresh_token(&access), Err(TokenError::InvalidToken));
        assert_eq!(tokens.parse_access_token(&refresh), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(extract_bearer(Some("abc.def.ghi")), Err(TokenError::MalformedHeader));
        assert_eq!(extract_bearer(Some("")), Err(TokenError::MissingHeader));
        assert_eq!(extract_bearer(None), Err(TokenError::MissingHeader));
        assert_eq!(extract_bearer(Some("Bearer a b")), Err(TokenError::MalformedHeader));
        assert_eq!(extract_bearer(Some("Basic abc")), Err(TokenError::MalformedHeader));
        assert_eq!(extract_bearer(Some("Bearer ")), Err(TokenError::MalformedHeader));
    }
}
