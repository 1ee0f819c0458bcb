use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use tracing::info;

use crate::database::models::{Role, User, UserStatus};
use crate::database::{DatabaseError, Statement, Store};

use super::authorization_service::AuthorizationService;
use super::code_service::CodeService;
use super::validate::validate_email_format;
use super::ServiceError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub family_name: Option<String>,
    pub nick_name: Option<String>,
}

/// Editable profile fields. Status, email and matricule are not among them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub family_name: Option<String>,
    pub nick_name: Option<String>,
    pub age: Option<i64>,
    pub birth_date: Option<DateTime<Utc>>,
    pub sex: Option<i64>,
}

pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: i64) -> Result<User, ServiceError> {
        Ok(self.store.find_by_id::<User>(user_id).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let stmt = Statement::new("SELECT * FROM \"user\" WHERE \"email\" = $1 AND \"deleted_at\" IS NULL LIMIT 1")
            .bind(normalize_email(email));
        Ok(self.store.fetch_optional_as::<User>(stmt).await?)
    }

    /// Creates a `New` user with the given level and a first verification code.
    pub async fn register(&self, level: Role, registration: Registration) -> Result<User, ServiceError> {
        let email = normalize_email(&registration.email);
        validate_email_format(&email)?;

        // (a) Reject known emails; the unique index backs this up under races
        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email is already registered".to_string()));
        }

        // (b) Insert the user, defaulting display names to the matricule
        let matricule = generate_matricule();
        let mut user = User {
            name: non_blank(registration.name).unwrap_or_else(|| matricule.clone()),
            family_name: non_blank(registration.family_name).unwrap_or_default(),
            nick_name: non_blank(registration.nick_name).unwrap_or_else(|| matricule.clone()),
            email,
            matricule,
            status: UserStatus::New,
            ..Default::default()
        };
        user.id = self.store.insert_entity(&user).await.map_err(|e| match e {
            DatabaseError::Conflict(_) => ServiceError::Conflict("Email is already registered".to_string()),
            other => other.into(),
        })?;

        // (c) Attach the authorization level and issue the first code
        AuthorizationService::new(self.store.clone()).grant(user.id, level).await?;
        CodeService::new(self.store.clone()).issue(user.id).await?;

        info!("Registered user {} as {}", user.id, level.name());
        self.get(user.id).await
    }

    pub async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<User, ServiceError> {
        let mut user = self.get(user_id).await?;

        if let Some(name) = non_blank(update.name) {
            user.name = name;
        }
        if let Some(family_name) = update.family_name {
            user.family_name = family_name.trim().to_string();
        }
        if let Some(nick_name) = non_blank(update.nick_name) {
            user.nick_name = nick_name;
        }
        if let Some(age) = update.age {
            if !(0..=150).contains(&age) {
                return Err(ServiceError::validation("age", "Age must be between 0 and 150"));
            }
            user.age = age;
        }
        if let Some(birth_date) = update.birth_date {
            user.birth_date = Some(birth_date);
        }
        if let Some(sex) = update.sex {
            user.sex = sex;
        }

        // Only the editable columns; status moves through promote_status alone
        let stmt = Statement::new(
            "UPDATE \"user\" SET \"name\" = $1, \"family_name\" = $2, \"nick_name\" = $3, \
             \"age\" = $4, \"birth_date\" = $5, \"sex\" = $6 WHERE \"id\" = $7",
        )
        .bind(user.name)
        .bind(user.family_name)
        .bind(user.nick_name)
        .bind(user.age)
        .bind(user.birth_date)
        .bind(user.sex)
        .bind(user_id);
        self.store.execute(stmt).await?;
        self.get(user_id).await
    }

    /// Moves the user forward to `target`. A user already at or past it is left alone.
    pub async fn promote_status(&self, user_id: i64, target: UserStatus) -> Result<User, ServiceError> {
        let stmt = Statement::new("UPDATE \"user\" SET \"status\" = $1 WHERE \"id\" = $2 AND \"status\" < $1")
            .bind(target)
            .bind(user_id);

        if self.store.execute(stmt).await? > 0 {
            info!("User {} promoted to {:?}", user_id, target);
        }
        self.get(user_id).await
    }

    pub async fn activate(&self, user_id: i64) -> Result<User, ServiceError> {
        let user = self.get(user_id).await?;
        if user.status <= UserStatus::NeedPassword {
            return Err(ServiceError::BadRequest(
                "A password must be set before the account can be activated".to_string(),
            ));
        }
        self.promote_status(user_id, UserStatus::Active).await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Millisecond timestamp followed by four random digits.
pub fn generate_matricule() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{:04}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{user_row, FakeStore, Reply};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// One user row whose status follows the conditional UPDATE.
    fn status_store(initial: UserStatus) -> (Arc<FakeStore>, Arc<AtomicI64>) {
        let status = Arc::new(AtomicI64::new(initial.code()));
        let shared = status.clone();
        let store = Arc::new(FakeStore::new(move |stmt| {
            if stmt.sql.starts_with("UPDATE \"user\" SET \"status\"") {
                let target = stmt.params[0].as_i64().unwrap();
                let current = shared.load(Ordering::SeqCst);
                if current < target {
                    shared.store(target, Ordering::SeqCst);
                    Reply::Affected(1)
                } else {
                    Reply::Affected(0)
                }
            } else if stmt.sql.starts_with("SELECT * FROM \"user\"") {
                let code = shared.load(Ordering::SeqCst);
                Reply::Row(Some(user_row(9, "a@b.com", UserStatus::from_code(code).unwrap())))
            } else if stmt.sql.starts_with("UPDATE \"user\" SET") {
                Reply::Affected(1)
            } else {
                Reply::Fail(format!("unexpected: {}", stmt.sql))
            }
        }));
        (store, status)
    }

    #[test]
    fn test_matricule_shape() {
        let m = generate_matricule();
        assert!(m.len() >= 17);
        assert!(m.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_promote_never_downgrades() {
        let (store, status) = status_store(UserStatus::Active);
        let user = UserService::new(store).promote_status(9, UserStatus::Unverified).await.unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(status.load(Ordering::SeqCst), UserStatus::Active.code());
    }

    #[tokio::test]
    async fn test_activate_requires_password() {
        let (store, _) = status_store(UserStatus::NeedPassword);
        let err = UserService::new(store).activate(9).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_activate_persists_active() {
        let (store, status) = status_store(UserStatus::OnboardingInProgress);
        let user = UserService::new(store.clone()).activate(9).await.unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(status.load(Ordering::SeqCst), UserStatus::Active.code());
    }

    #[tokio::test]
    async fn test_update_profile_writes_editable_columns_only() {
        let (store, _) = status_store(UserStatus::Unverified);
        let update = ProfileUpdate {
            name: Some("  Awa ".to_string()),
            age: Some(17),
            ..Default::default()
        };
        UserService::new(store.clone()).update_profile(9, update).await.unwrap();

        let write = store
            .statements()
            .into_iter()
            .find(|s| s.sql.starts_with("UPDATE \"user\" SET \"name\""))
            .unwrap();
        assert_eq!(write.params.len(), 7);
        assert_eq!(write.params[0].as_str(), Some("Awa"));
        assert_eq!(write.params[3].as_i64(), Some(17));
        assert_eq!(write.params[6].as_i64(), Some(9));
        for column in ["status", "email", "matricule", "profile_image_xid"] {
            assert!(!write.sql.contains(&format!("\"{}\"", column)), "{} was written", column);
        }
    }

    /// Value bound to `"status" = $n` in a statement, if it writes the column.
    fn written_status(stmt: &Statement) -> Option<i64> {
        let marker = "\"status\" = $";
        let at = stmt.sql.find(marker)? + marker.len();
        let n: usize = stmt.sql[at..].chars().take_while(char::is_ascii_digit).collect::<String>().parse().ok()?;
        stmt.params.get(n - 1)?.as_i64()
    }

    #[tokio::test]
    async fn test_update_profile_keeps_concurrent_promotion() {
        let status = Arc::new(AtomicI64::new(UserStatus::NeedPassword.code()));
        let shared = status.clone();
        let store = Arc::new(FakeStore::new(move |stmt| {
            if stmt.sql.starts_with("SELECT * FROM \"user\"") {
                let code = shared.load(Ordering::SeqCst);
                // A password is set right after this read
                shared.fetch_max(UserStatus::OnboardingInProgress.code(), Ordering::SeqCst);
                Reply::Row(Some(user_row(9, "a@b.com", UserStatus::from_code(code).unwrap())))
            } else if stmt.sql.starts_with("UPDATE \"user\" SET") {
                if let Some(code) = written_status(stmt) {
                    shared.store(code, Ordering::SeqCst);
                }
                Reply::Affected(1)
            } else {
                Reply::Fail(format!("unexpected: {}", stmt.sql))
            }
        }));

        let update = ProfileUpdate {
            name: Some("Awa".to_string()),
            ..Default::default()
        };
        let user = UserService::new(store).update_profile(9, update).await.unwrap();

        assert_eq!(status.load(Ordering::SeqCst), UserStatus::OnboardingInProgress.code());
        assert_eq!(user.status, UserStatus::OnboardingInProgress);
    }

    #[test]
    fn test_profile_update_rejects_status() {
        let parsed: Result<ProfileUpdate, _> = serde_json::from_value(serde_json::json!({ "status": 4 }));
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_register_rejects_known_email() {
        let store = Arc::new(FakeStore::new(|stmt| {
            if stmt.sql.contains("\"email\" = $1") {
                Reply::Row(Some(user_row(1, "a@b.com", UserStatus::New)))
            } else {
                Reply::Fail(format!("unexpected: {}", stmt.sql))
            }
        }));
        let registration = Registration {
            email: "A@b.com ".to_string(),
            ..Default::default()
        };
        let err = UserService::new(store).register(Role::Student, registration).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_creates_user_level_and_code() {
        let store = Arc::new(FakeStore::new(|stmt| {
            if stmt.sql.contains("\"email\" = $1") {
                Reply::Row(None)
            } else if stmt.sql.starts_with("INSERT INTO \"user\"") {
                Reply::Inserted(31)
            } else if stmt.sql.starts_with("INSERT INTO \"authorization\"") {
                Reply::Inserted(32)
            } else if stmt.sql.starts_with("INSERT INTO \"code\"") {
                Reply::Inserted(33)
            } else if stmt.sql.starts_with("SELECT * FROM \"user\"") {
                Reply::Row(Some(user_row(31, "a@b.com", UserStatus::New)))
            } else {
                Reply::Fail(format!("unexpected: {}", stmt.sql))
            }
        }));
        let registration = Registration {
            email: "a@b.com".to_string(),
            ..Default::default()
        };
        let user = UserService::new(store.clone()).register(Role::Student, registration).await.unwrap();
        assert_eq!(user.id, 31);
        assert_eq!(user.status, UserStatus::New);

        let insert = &store.statements()[1];
        // name and nick_name default to the matricule
        assert_eq!(insert.params[0], insert.params[4]);
        assert_eq!(insert.params[2], insert.params[4]);
        assert_eq!(insert.params[8].as_i64(), Some(0));
        assert_eq!(store.count_matching("INSERT INTO \"authorization\""), 1);
        assert_eq!(store.count_matching("INSERT INTO \"code\""), 1);
    }

    #[tokio::test]
    async fn test_register_validates_email() {
        let store = Arc::new(FakeStore::new(|_| Reply::Fail("no statement expected".into())));
        let registration = Registration {
            email: "not-an-email".to_string(),
            ..Default::default()
        };
        let err = UserService::new(store.clone()).register(Role::Parent, registration).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { field: "email", .. }));
        assert!(store.statements().is_empty());
    }
}
