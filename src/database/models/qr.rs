use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_entity;

/// One-time QR login ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrCodeRegistry {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub xid: String,
    pub is_used: bool,
}

impl_entity!(QrCodeRegistry { id, created_at, updated_at, deleted_at, user_id, xid, is_used });
