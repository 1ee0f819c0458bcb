use std::sync::Arc;

use tracing::info;

use crate::database::models::{Education, Role, Subject, UserEducationLevelSubject};
use crate::database::{DatabaseError, Statement, Store};

use super::authorization_service::{permissions, AuthorizationService};
use super::ServiceError;

/// Partial unique index holding students to a single link.
const SINGLE_LEVEL_KEY: &str = "user_education_level_subject_single_level_key";

const USER_LEVEL_SQL: &str = "SELECT \"education\".* FROM \"education\" \
    JOIN \"subject\" ON \"education\".\"id\" = \"subject\".\"education_level_id\" \
    JOIN \"user_education_level_subject\" ON \"subject\".\"id\" = \"user_education_level_subject\".\"subject_id\" \
    WHERE \"user_education_level_subject\".\"user_id\" = $1 AND \"education\".\"deleted_at\" IS NULL \
    ORDER BY \"user_education_level_subject\".\"id\" LIMIT 1";

pub struct EducationService {
    store: Arc<dyn Store>,
}

impl EducationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn levels(&self) -> Result<Vec<Education>, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"education\" WHERE \"deleted_at\" IS NULL ORDER BY \"created_at\", \"id\"",
        );
        Ok(self.store.fetch_all_as(stmt).await?)
    }

    pub async fn subjects(&self, level_id: i64) -> Result<Vec<Subject>, ServiceError> {
        self.store
            .find_by_id::<Education>(level_id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound(_) => ServiceError::NotFound(format!("Education level {} not found", level_id)),
                other => other.into(),
            })?;

        let stmt = Statement::new(
            "SELECT * FROM \"subject\" WHERE \"education_level_id\" = $1 AND \"deleted_at\" IS NULL ORDER BY \"id\"",
        )
        .bind(level_id);
        Ok(self.store.fetch_all_as(stmt).await?)
    }

    async fn subject(&self, subject_id: i64) -> Result<Subject, ServiceError> {
        self.store.find_by_id::<Subject>(subject_id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => ServiceError::NotFound(format!("Subject {} not found", subject_id)),
            other => other.into(),
        })
    }

    async fn link_count(&self, user_id: i64) -> Result<usize, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"user_education_level_subject\" WHERE \"user_id\" = $1 AND \"deleted_at\" IS NULL",
        )
        .bind(user_id);
        Ok(self.store.fetch_all(stmt).await?.len())
    }

    /// Links the caller to a subject and returns the level it belongs to.
    /// Students hold a single link; professors may teach several subjects.
    pub async fn assign(&self, user_id: i64, subject_id: i64) -> Result<Education, ServiceError> {
        let authorization = AuthorizationService::new(self.store.clone())
            .require(user_id, permissions::EDUCATION_ASSIGN)
            .await?;
        let subject = self.subject(subject_id).await?;

        let single_level = authorization.level == Role::Student;
        if single_level && self.link_count(user_id).await? > 0 {
            return Err(level_already_set());
        }

        self.insert_link(user_id, subject.id, single_level).await?;
        self.user_level(user_id).await
    }

    /// Drops every existing link, then links the caller to `subject_id`.
    pub async fn replace(&self, user_id: i64, subject_id: i64) -> Result<Education, ServiceError> {
        let authorization = AuthorizationService::new(self.store.clone())
            .require(user_id, permissions::EDUCATION_ASSIGN)
            .await?;
        let subject = self.subject(subject_id).await?;

        let stmt = Statement::new("DELETE FROM \"user_education_level_subject\" WHERE \"user_id\" = $1").bind(user_id);
        let removed = self.store.execute(stmt).await?;
        info!("Cleared {} education links of user {}", removed, user_id);

        self.insert_link(user_id, subject.id, authorization.level == Role::Student)
            .await?;
        self.user_level(user_id).await
    }

    async fn insert_link(&self, user_id: i64, subject_id: i64, single_level: bool) -> Result<(), ServiceError> {
        let link = UserEducationLevelSubject {
            user_id,
            subject_id,
            single_level,
            ..Default::default()
        };
        self.store.insert_entity(&link).await.map_err(|e| match e {
            DatabaseError::Conflict(key) if key == SINGLE_LEVEL_KEY => level_already_set(),
            DatabaseError::Conflict(_) => ServiceError::Conflict("Subject already assigned".to_string()),
            other => other.into(),
        })?;
        info!("Linked user {} to subject {}", user_id, subject_id);
        Ok(())
    }

    pub async fn user_level(&self, user_id: i64) -> Result<Education, ServiceError> {
        let stmt = Statement::new(USER_LEVEL_SQL).bind(user_id);
        self.store
            .fetch_optional_as::<Education>(stmt)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No education level for this account".to_string()))
    }

    /// Students see every subject of their level; professors see the
    /// subjects they are linked to.
    pub async fn user_subjects(&self, user_id: i64) -> Result<Vec<Subject>, ServiceError> {
        let authorization = AuthorizationService::new(self.store.clone())
            .require(user_id, permissions::SUBJECT_LIST)
            .await?;

        let stmt = match authorization.level {
            Role::Student => {
                let level = self.user_level(user_id).await?;
                Statement::new(
                    "SELECT * FROM \"subject\" WHERE \"education_level_id\" = $1 AND \"deleted_at\" IS NULL \
                     ORDER BY \"id\"",
                )
                .bind(level.id)
            }
            _ => Statement::new(
                "SELECT \"subject\".* FROM \"subject\" \
                 JOIN \"user_education_level_subject\" ON \"subject\".\"id\" = \"user_education_level_subject\".\"subject_id\" \
                 WHERE \"user_education_level_subject\".\"user_id\" = $1 AND \"subject\".\"deleted_at\" IS NULL \
                 ORDER BY \"subject\".\"id\"",
            )
            .bind(user_id),
        };
        Ok(self.store.fetch_all_as(stmt).await?)
    }
}

fn level_already_set() -> ServiceError {
    ServiceError::Conflict("An education level is already set; use PUT to change it".to_string())
}
