use std::sync::Arc;

use tracing::{info, warn};

use crate::database::models::{Authorization, Role};
use crate::database::{Statement, Store};

use super::ServiceError;

/// Permitted levels, per operation.
pub mod permissions {
    use crate::database::models::Role;

    /// Setting or replacing one's own education level.
    pub const EDUCATION_ASSIGN: &[Role] = &[Role::Student, Role::Professor];
    /// Listing one's own subjects.
    pub const SUBJECT_LIST: &[Role] = &[Role::Student, Role::Professor];
    /// Rating another user.
    pub const RATE_USER: &[Role] = &[Role::Tutor, Role::Professor];
    /// Reading the marks one has authored.
    pub const AUTHORED_MARKS: &[Role] = &[Role::Tutor, Role::Professor];
}

/// Looks up and enforces authorization levels. The store is the source of
/// truth; the level claim inside a token is never trusted on its own.
pub struct AuthorizationService {
    store: Arc<dyn Store>,
}

impl AuthorizationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn grant(&self, user_id: i64, level: Role) -> Result<Authorization, ServiceError> {
        let mut authorization = Authorization {
            user_id,
            level,
            ..Default::default()
        };
        authorization.id = self.store.insert_entity(&authorization).await?;
        info!("Granted level {} to user {}", level.name(), user_id);
        Ok(authorization)
    }

    pub async fn find(&self, user_id: i64) -> Result<Authorization, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"authorization\" WHERE \"user_id\" = $1 AND \"deleted_at\" IS NULL \
             ORDER BY \"id\" LIMIT 1",
        )
        .bind(user_id);

        self.store
            .fetch_optional_as::<Authorization>(stmt)
            .await?
            .ok_or_else(|| ServiceError::Forbidden("No authorization level for this account".to_string()))
    }

    /// The caller's authorization row, provided its level is in `allowed`.
    pub async fn require(&self, user_id: i64, allowed: &[Role]) -> Result<Authorization, ServiceError> {
        let authorization = self.find(user_id).await?;
        if !allowed.contains(&authorization.level) {
            warn!(
                "User {} with level {} denied; requires one of {:?}",
                user_id,
                authorization.level.name(),
                allowed.iter().map(|r| r.name()).collect::<Vec<_>>()
            );
            return Err(ServiceError::Forbidden(format!(
                "This action is not available to a {}",
                authorization.level.name()
            )));
        }
        Ok(authorization)
    }
}
