use std::sync::Arc;

use tracing::{debug, info};

use crate::database::models::{Password, PasswordRecord, User, UserStatus};
use crate::database::{Statement, Store};

use super::user_service::UserService;
use super::validate::validate_password;
use super::ServiceError;

/// Password history per user. Only the most recent entry is live.
pub struct PasswordService {
    store: Arc<dyn Store>,
    cost: u32,
}

impl PasswordService {
    pub fn new(store: Arc<dyn Store>, cost: u32) -> Self {
        Self { store, cost }
    }

    /// Stores a new hash and moves the user to onboarding. Safe to repeat:
    /// a user already at or past onboarding keeps their status.
    pub async fn set_password(&self, user_id: i64, password: &str) -> Result<User, ServiceError> {
        validate_password(password)?;

        let password = Password {
            user_id,
            psw: hash_password(password, self.cost).await?,
            ..Default::default()
        };
        self.store.insert_entity(&password).await?;
        info!("Stored new password for user {}", user_id);

        UserService::new(self.store.clone())
            .promote_status(user_id, UserStatus::OnboardingInProgress)
            .await
    }

    /// `false` when the user has no password at all.
    pub async fn verify_latest(&self, user_id: i64, candidate: &str) -> Result<bool, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"password\" WHERE \"user_id\" = $1 AND \"deleted_at\" IS NULL \
             ORDER BY \"created_at\" DESC, \"id\" DESC LIMIT 1",
        )
        .bind(user_id);

        let Some(latest) = self.store.fetch_optional_as::<Password>(stmt).await? else {
            debug!("User {} has no password on record", user_id);
            return Ok(false);
        };
        verify_password(candidate, latest.psw).await
    }

    pub async fn history(&self, user_id: i64) -> Result<Vec<PasswordRecord>, ServiceError> {
        let stmt = Statement::new(
            "SELECT \"id\", \"created_at\" FROM \"password\" WHERE \"user_id\" = $1 AND \"deleted_at\" IS NULL \
             ORDER BY \"created_at\" DESC, \"id\" DESC",
        )
        .bind(user_id);
        Ok(self.store.fetch_all_as::<PasswordRecord>(stmt).await?)
    }
}

/// bcrypt is CPU-bound; keep it off the async workers.
async fn hash_password(password: &str, cost: u32) -> Result<String, ServiceError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::Internal(format!("bcrypt hash failed: {}", e)))
}

async fn verify_password(candidate: &str, hash: String) -> Result<bool, ServiceError> {
    let candidate = candidate.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("verify task failed: {}", e)))?;

    // A corrupt stored hash counts as a mismatch
    Ok(verified.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, user_row, FakeStore, Reply};
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    const COST: u32 = 4;

    #[tokio::test]
    async fn test_set_password_twice_promotes_once() {
        let status = Arc::new(AtomicI64::new(UserStatus::NeedPassword.code()));
        let promotions = Arc::new(AtomicUsize::new(0));
        let hashes = Arc::new(Mutex::new(Vec::new()));

        let store = {
            let (status, promotions, hashes) = (status.clone(), promotions.clone(), hashes.clone());
            Arc::new(FakeStore::new(move |stmt| {
                if stmt.sql.starts_with("INSERT INTO \"password\"") {
                    hashes.lock().unwrap().push(stmt.params[1].as_str().unwrap().to_string());
                    Reply::Inserted(1)
                } else if stmt.sql.starts_with("UPDATE \"user\" SET \"status\"") {
                    let target = stmt.params[0].as_i64().unwrap();
                    if status.load(Ordering::SeqCst) < target {
                        status.store(target, Ordering::SeqCst);
                        promotions.fetch_add(1, Ordering::SeqCst);
                        Reply::Affected(1)
                    } else {
                        Reply::Affected(0)
                    }
                } else {
                    let current = UserStatus::from_code(status.load(Ordering::SeqCst)).unwrap();
                    Reply::Row(Some(user_row(8, "a@b.com", current)))
                }
            }))
        };
        let service = PasswordService::new(store, COST);

        let first = service.set_password(8, "secret").await.unwrap();
        assert_eq!(first.status, UserStatus::OnboardingInProgress);
        let second = service.set_password(8, "another").await.unwrap();
        assert_eq!(second.status, UserStatus::OnboardingInProgress);

        assert_eq!(promotions.load(Ordering::SeqCst), 1);
        let hashes = hashes.lock().unwrap();
        assert_eq!(hashes.len(), 2);
        assert!(hashes.iter().all(|h| h.starts_with("$2") && !h.contains("secret")));
    }

    #[tokio::test]
    async fn test_set_password_never_downgrades_active() {
        let store = Arc::new(FakeStore::new(|stmt| {
            if stmt.sql.starts_with("INSERT") {
                Reply::Inserted(1)
            } else if stmt.sql.starts_with("UPDATE") {
                Reply::Affected(0)
            } else {
                Reply::Row(Some(user_row(8, "a@b.com", UserStatus::Active)))
            }
        }));
        let user = PasswordService::new(store, COST).set_password(8, "secret").await.unwrap();
        assert_eq!(user.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_set_password_rejects_long_input() {
        let store = Arc::new(FakeStore::new(|_| Reply::Fail("no statement expected".into())));
        let err = PasswordService::new(store.clone(), COST)
            .set_password(8, &"x".repeat(19))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "password", .. }));
        assert!(store.statements().is_empty());
    }

    #[tokio::test]
    async fn test_verify_latest() {
        let hash = bcrypt::hash("secret", COST).unwrap();
        let store = Arc::new(FakeStore::new(move |_| {
            Reply::Row(Some(row(json!({ "id": 3, "user_id": 8, "psw": hash.clone() }))))
        }));
        let service = PasswordService::new(store, COST);
        assert!(service.verify_latest(8, "secret").await.unwrap());
        assert!(!service.verify_latest(8, "Secret").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_without_password_is_false() {
        let store = Arc::new(FakeStore::new(|_| Reply::Row(None)));
        assert!(!PasswordService::new(store, COST).verify_latest(8, "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_history_exposes_no_hash() {
        let store = Arc::new(FakeStore::new(|_| {
            Reply::Rows(vec![
                row(json!({ "id": 2, "created_at": "2024-02-01T00:00:00+00:00" })),
                row(json!({ "id": 1, "created_at": "2024-01-01T00:00:00+00:00" })),
            ])
        }));
        let history = PasswordService::new(store.clone(), COST).history(8).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!store.statements()[0].sql.contains("psw"));

        let body = serde_json::to_value(&history).unwrap();
        assert!(body[0].get("psw").is_none());
    }
}
