use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::value::SqlValue;
use crate::impl_entity;

/// Authorization level attached to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Role {
    #[default]
    Student,
    Parent,
    Tutor,
    Professor,
}

impl Role {
    pub fn code(self) -> i64 {
        match self {
            Role::Student => 0,
            Role::Parent => 1,
            Role::Tutor => 2,
            Role::Professor => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Role::Student),
            1 => Some(Role::Parent),
            2 => Some(Role::Tutor),
            3 => Some(Role::Professor),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Tutor => "tutor",
            Role::Professor => "professor",
        }
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl TryFrom<i64> for Role {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Role::from_code(code).ok_or_else(|| format!("unknown authorization level {}", code))
    }
}

impl From<Role> for SqlValue {
    fn from(role: Role) -> Self {
        SqlValue::Int(Some(role.code()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Authorization {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub level: Role,
}

impl_entity!(Authorization { id, created_at, updated_at, deleted_at, user_id, level });
