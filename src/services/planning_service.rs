use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::database::models::{Authorization, CalendarPlanning, CalendarPlanningActor, User};
use crate::database::{DatabaseError, Statement, Store};

use super::authorization_service::AuthorizationService;
use super::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct PlanningInput {
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

/// Calendar entries. A planning belongs to its author's authorization row;
/// actors are further authorization rows attached to it.
pub struct PlanningService {
    store: Arc<dyn Store>,
}

impl PlanningService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn authorizations(&self) -> AuthorizationService {
        AuthorizationService::new(self.store.clone())
    }

    pub async fn create(&self, user_id: i64, input: PlanningInput) -> Result<CalendarPlanning, ServiceError> {
        if input.end_date_time <= input.start_date_time {
            return Err(ServiceError::validation(
                "end_date_time",
                "The planning must end after it starts",
            ));
        }
        let author = self.authorizations().find(user_id).await?;

        let mut planning = CalendarPlanning {
            authorization_id: author.id,
            start_date_time: Some(input.start_date_time),
            end_date_time: Some(input.end_date_time),
            description: input.description.trim().to_string(),
            ..Default::default()
        };
        planning.id = self.store.insert_entity(&planning).await?;
        self.attach(planning.id, author.id).await?;

        info!("User {} created planning {}", user_id, planning.id);
        Ok(planning)
    }

    /// Plannings the caller takes part in, authored ones included.
    pub async fn list(&self, user_id: i64) -> Result<Vec<CalendarPlanning>, ServiceError> {
        let me = self.authorizations().find(user_id).await?;
        let stmt = Statement::new(
            "SELECT \"calendar_planning\".* FROM \"calendar_planning\" \
             JOIN \"calendar_planning_actor\" ON \"calendar_planning\".\"id\" = \"calendar_planning_actor\".\"calendar_planning_id\" \
             WHERE \"calendar_planning_actor\".\"authorization_id\" = $1 AND \"calendar_planning\".\"deleted_at\" IS NULL \
             ORDER BY \"calendar_planning\".\"start_date_time\"",
        )
        .bind(me.id);
        Ok(self.store.fetch_all_as(stmt).await?)
    }

    async fn planning(&self, calendar_id: i64) -> Result<CalendarPlanning, ServiceError> {
        self.store
            .find_by_id::<CalendarPlanning>(calendar_id)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound(_) => ServiceError::NotFound(format!("Planning {} not found", calendar_id)),
                other => other.into(),
            })
    }

    /// The planning, provided `user_id` authored it.
    async fn authored(&self, user_id: i64, calendar_id: i64) -> Result<CalendarPlanning, ServiceError> {
        let planning = self.planning(calendar_id).await?;
        let me = self.authorizations().find(user_id).await?;
        if planning.authorization_id != me.id {
            return Err(ServiceError::Forbidden(
                "Only the author can change this planning".to_string(),
            ));
        }
        Ok(planning)
    }

    pub async fn delete(&self, user_id: i64, calendar_id: i64) -> Result<(), ServiceError> {
        let planning = self.authored(user_id, calendar_id).await?;

        let stmt = Statement::new("DELETE FROM \"calendar_planning_actor\" WHERE \"calendar_planning_id\" = $1")
            .bind(planning.id);
        self.store.execute(stmt).await?;
        self.store.delete_entity(&planning).await?;

        info!("User {} deleted planning {}", user_id, planning.id);
        Ok(())
    }

    pub async fn add_actor(&self, user_id: i64, calendar_id: i64, actor_user_id: i64) -> Result<(), ServiceError> {
        let planning = self.authored(user_id, calendar_id).await?;
        let actor = self.actor_authorization(actor_user_id).await?;

        if self.membership(planning.id, actor.id).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "User {} already takes part in this planning",
                actor_user_id
            )));
        }
        self.attach(planning.id, actor.id).await?;
        info!("Added user {} to planning {}", actor_user_id, planning.id);
        Ok(())
    }

    pub async fn remove_actor(&self, user_id: i64, calendar_id: i64, actor_user_id: i64) -> Result<(), ServiceError> {
        let planning = self.authored(user_id, calendar_id).await?;
        let actor = self.actor_authorization(actor_user_id).await?;

        let membership = self.membership(planning.id, actor.id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("User {} does not take part in this planning", actor_user_id))
        })?;
        self.store.delete_entity(&membership).await?;
        info!("Removed user {} from planning {}", actor_user_id, planning.id);
        Ok(())
    }

    pub async fn actors(&self, calendar_id: i64) -> Result<Vec<User>, ServiceError> {
        let planning = self.planning(calendar_id).await?;
        let stmt = Statement::new(
            "SELECT \"user\".* FROM \"user\" \
             JOIN \"authorization\" ON \"user\".\"id\" = \"authorization\".\"user_id\" \
             JOIN \"calendar_planning_actor\" ON \"authorization\".\"id\" = \"calendar_planning_actor\".\"authorization_id\" \
             WHERE \"calendar_planning_actor\".\"calendar_planning_id\" = $1 AND \"user\".\"deleted_at\" IS NULL \
             ORDER BY \"calendar_planning_actor\".\"id\"",
        )
        .bind(planning.id);
        Ok(self.store.fetch_all_as(stmt).await?)
    }

    async fn actor_authorization(&self, actor_user_id: i64) -> Result<Authorization, ServiceError> {
        self.authorizations().find(actor_user_id).await.map_err(|e| match e {
            ServiceError::Forbidden(_) => ServiceError::NotFound(format!("User {} not found", actor_user_id)),
            other => other,
        })
    }

    async fn membership(
        &self,
        calendar_id: i64,
        authorization_id: i64,
    ) -> Result<Option<CalendarPlanningActor>, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"calendar_planning_actor\" WHERE \"calendar_planning_id\" = $1 \
             AND \"authorization_id\" = $2 AND \"deleted_at\" IS NULL LIMIT 1",
        )
        .bind(calendar_id)
        .bind(authorization_id);
        Ok(self.store.fetch_optional_as(stmt).await?)
    }

    async fn attach(&self, calendar_id: i64, authorization_id: i64) -> Result<(), ServiceError> {
        let actor = CalendarPlanningActor {
            authorization_id,
            calendar_planning_id: calendar_id,
            ..Default::default()
        };
        self.store.insert_entity(&actor).await?;
        Ok(())
    }
}
