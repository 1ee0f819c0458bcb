use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_entity;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Password {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub psw: String,
}

impl_entity!(Password { id, created_at, updated_at, deleted_at, user_id, psw });

/// History entry. Carries no hash material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRecord {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
}
