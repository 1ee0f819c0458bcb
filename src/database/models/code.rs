use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_entity;

/// Email verification code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Code {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    #[serde(rename(serialize = "value"))]
    pub verification_code: i64,
}

impl_entity!(Code { id, created_at, updated_at, deleted_at, user_id, verification_code });
