use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::models::mark::MAX_MARK;
use crate::database::models::{User, UserMark};
use crate::database::{DatabaseError, Statement, Store};

use super::authorization_service::{permissions, AuthorizationService};
use super::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct MarkInput {
    pub user_id: i64,
    #[serde(default)]
    pub author_comment: String,
    pub author_mark: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkAverage {
    pub user_id: i64,
    /// Truncated toward zero.
    pub average: i64,
    pub count: i64,
}

pub struct MarkService {
    store: Arc<dyn Store>,
}

impl MarkService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn rate(&self, author_id: i64, input: MarkInput) -> Result<UserMark, ServiceError> {
        AuthorizationService::new(self.store.clone())
            .require(author_id, permissions::RATE_USER)
            .await?;

        if !(0..=MAX_MARK).contains(&input.author_mark) {
            return Err(ServiceError::validation(
                "author_mark",
                format!("Mark must be between 0 and {}", MAX_MARK),
            ));
        }
        if input.user_id == author_id {
            return Err(ServiceError::BadRequest("You cannot rate yourself".to_string()));
        }
        self.store.find_by_id::<User>(input.user_id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => ServiceError::NotFound(format!("User {} not found", input.user_id)),
            other => other.into(),
        })?;

        let mut mark = UserMark {
            user_id: input.user_id,
            author_id,
            author_comment: input.author_comment.trim().to_string(),
            author_mark: input.author_mark,
            ..Default::default()
        };
        mark.id = self.store.insert_entity(&mark).await?;
        info!("User {} rated user {} with {}", author_id, mark.user_id, mark.author_mark);
        Ok(mark)
    }

    pub async fn average(&self, user_id: i64) -> Result<MarkAverage, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"user_mark\" WHERE \"user_id\" = $1 AND \"deleted_at\" IS NULL",
        )
        .bind(user_id);
        let marks: Vec<UserMark> = self.store.fetch_all_as(stmt).await?;

        if marks.is_empty() {
            return Err(ServiceError::NotFound(format!("User {} has not been rated", user_id)));
        }
        let count = marks.len() as i64;
        let total: i64 = marks.iter().map(|m| m.author_mark).sum();

        Ok(MarkAverage {
            user_id,
            average: total / count,
            count,
        })
    }

    pub async fn authored(&self, author_id: i64) -> Result<Vec<UserMark>, ServiceError> {
        AuthorizationService::new(self.store.clone())
            .require(author_id, permissions::AUTHORED_MARKS)
            .await?;

        let stmt = Statement::new(
            "SELECT * FROM \"user_mark\" WHERE \"author_id\" = $1 AND \"deleted_at\" IS NULL \
             ORDER BY \"created_at\" DESC, \"id\" DESC",
        )
        .bind(author_id);
        Ok(self.store.fetch_all_as(stmt).await?)
    }
}
