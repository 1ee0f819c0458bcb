use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_entity;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub street: String,
    pub full_address: String,
    pub xid: String,
}

impl_entity!(Address {
    id,
    created_at,
    updated_at,
    deleted_at,
    country,
    city,
    latitude,
    longitude,
    street,
    full_address,
    xid,
});

/// Link between a user and an address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAddress {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub address_id: i64,
    pub address_type: String,
}

impl_entity!(UserAddress { id, created_at, updated_at, deleted_at, user_id, address_id, address_type });
