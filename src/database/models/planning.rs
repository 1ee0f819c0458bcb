use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_entity;

/// A calendar slot owned by the authorization row of its author.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarPlanning {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub authorization_id: i64,
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
    pub description: String,
}

impl_entity!(CalendarPlanning {
    id,
    created_at,
    updated_at,
    deleted_at,
    authorization_id,
    start_date_time,
    end_date_time,
    description,
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarPlanningActor {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub authorization_id: i64,
    pub calendar_planning_id: i64,
}

impl_entity!(CalendarPlanningActor { id, created_at, updated_at, deleted_at, authorization_id, calendar_planning_id });
