use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_entity;

/// Education level (e.g. "Terminale").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
}

impl_entity!(Education { id, created_at, updated_at, deleted_at, name });

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub education_level_id: i64,
    pub name: String,
}

impl_entity!(Subject { id, created_at, updated_at, deleted_at, education_level_id, name });

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserEducationLevelSubject {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub subject_id: i64,
    /// Set on student links; at most one such link may exist per user.
    pub single_level: bool,
}

impl_entity!(UserEducationLevelSubject { id, created_at, updated_at, deleted_at, user_id, subject_id, single_level });
