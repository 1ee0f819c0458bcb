use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::database::models::{Code, User, UserStatus};
use crate::database::{Statement, Store};

use super::user_service::UserService;
use super::ServiceError;

/// Upper bound of a verification code, inclusive.
pub const MAX_CODE: i64 = 9999;

pub struct CodeService {
    store: Arc<dyn Store>,
}

impl CodeService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn issue(&self, user_id: i64) -> Result<Code, ServiceError> {
        let mut code = Code {
            user_id,
            verification_code: rand::thread_rng().gen_range(0..=MAX_CODE),
            ..Default::default()
        };
        code.id = self.store.insert_entity(&code).await?;
        info!("Issued verification code {} for user {}", code.id, user_id);
        Ok(code)
    }

    pub async fn latest(&self, user_id: i64) -> Result<Code, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"code\" WHERE \"user_id\" = $1 AND \"deleted_at\" IS NULL \
             ORDER BY \"created_at\" DESC, \"id\" DESC LIMIT 1",
        )
        .bind(user_id);

        self.store
            .fetch_optional_as::<Code>(stmt)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No verification code for this account".to_string()))
    }

    /// Issues a fresh code and marks the account as awaiting verification.
    pub async fn resend(&self, user_id: i64) -> Result<Code, ServiceError> {
        let code = self.issue(user_id).await?;
        UserService::new(self.store.clone())
            .promote_status(user_id, UserStatus::Unverified)
            .await?;
        Ok(code)
    }

    /// Checks `submitted` against the latest code only; older codes are dead.
    pub async fn confirm(&self, user_id: i64, submitted: i64) -> Result<User, ServiceError> {
        let latest = self.latest(user_id).await?;
        if latest.verification_code != submitted {
            warn!("User {} submitted a wrong verification code", user_id);
            return Err(ServiceError::validation("code", "Verification code does not match"));
        }

        UserService::new(self.store.clone())
            .promote_status(user_id, UserStatus::NeedPassword)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, user_row, FakeStore, Reply};
    use serde_json::json;

    fn code_row(id: i64, value: i64) -> Reply {
        Reply::Row(Some(row(json!({
            "id": id,
            "created_at": "2024-01-01T00:00:00+00:00",
            "updated_at": null,
            "deleted_at": null,
            "user_id": 4,
            "verification_code": value
        }))))
    }

    #[tokio::test]
    async fn test_issue_stays_in_range() {
        let store = Arc::new(FakeStore::new(|_| Reply::Inserted(1)));
        let service = CodeService::new(store);
        for _ in 0..50 {
            let code = service.issue(4).await.unwrap();
            assert!((0..=MAX_CODE).contains(&code.verification_code));
        }
    }

    #[tokio::test]
    async fn test_confirm_rejects_mismatch() {
        let store = Arc::new(FakeStore::new(|_| code_row(2, 1234)));
        let err = CodeService::new(store.clone()).confirm(4, 4321).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "code", .. }));
        assert_eq!(store.count_matching("UPDATE"), 0);
    }

    #[tokio::test]
    async fn test_confirm_promotes_to_need_password() {
        let store = Arc::new(FakeStore::new(|stmt| {
            if stmt.sql.contains("FROM \"code\"") {
                code_row(2, 1234)
            } else if stmt.sql.starts_with("UPDATE \"user\" SET \"status\"") {
                Reply::Affected(1)
            } else {
                Reply::Row(Some(user_row(4, "a@b.com", UserStatus::NeedPassword)))
            }
        }));
        let user = CodeService::new(store.clone()).confirm(4, 1234).await.unwrap();
        assert_eq!(user.status, UserStatus::NeedPassword);

        let update = store
            .statements()
            .into_iter()
            .find(|s| s.sql.starts_with("UPDATE"))
            .unwrap();
        assert_eq!(update.params[0].as_i64(), Some(UserStatus::NeedPassword.code()));
    }

    #[tokio::test]
    async fn test_latest_missing_is_not_found() {
        let store = Arc::new(FakeStore::new(|_| Reply::Row(None)));
        let err = CodeService::new(store).latest(4).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_code_serializes_as_value() {
        let code = Code {
            verification_code: 42,
            ..Default::default()
        };
        let body = serde_json::to_value(&code).unwrap();
        assert_eq!(body["value"], 42);
        assert!(body.get("verification_code").is_none());
    }
}
