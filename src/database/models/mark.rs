use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_entity;

pub const MAX_MARK: i64 = 5;

/// A rating left by a tutor or professor about another user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMark {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub author_id: i64,
    pub author_comment: String,
    pub author_mark: i64,
}

impl_entity!(UserMark { id, created_at, updated_at, deleted_at, user_id, author_id, author_comment, author_mark });
