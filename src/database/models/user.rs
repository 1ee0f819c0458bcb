use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::value::SqlValue;
use crate::impl_entity;

/// Account lifecycle. Ordered: a user only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum UserStatus {
    #[default]
    New,
    Unverified,
    NeedPassword,
    OnboardingInProgress,
    Active,
}

impl UserStatus {
    pub fn code(self) -> i64 {
        match self {
            UserStatus::New => 0,
            UserStatus::Unverified => 1,
            UserStatus::NeedPassword => 2,
            UserStatus::OnboardingInProgress => 3,
            UserStatus::Active => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(UserStatus::New),
            1 => Some(UserStatus::Unverified),
            2 => Some(UserStatus::NeedPassword),
            3 => Some(UserStatus::OnboardingInProgress),
            4 => Some(UserStatus::Active),
            _ => None,
        }
    }
}

impl From<UserStatus> for i64 {
    fn from(status: UserStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i64> for UserStatus {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        UserStatus::from_code(code).ok_or_else(|| format!("unknown user status {}", code))
    }
}

impl From<UserStatus> for SqlValue {
    fn from(status: UserStatus) -> Self {
        SqlValue::Int(Some(status.code()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub family_name: String,
    pub nick_name: String,
    pub email: String,
    pub matricule: String,
    pub age: i64,
    pub birth_date: Option<DateTime<Utc>>,
    pub sex: i64,
    pub status: UserStatus,
    pub profile_image_xid: String,
}

impl_entity!(User {
    id,
    created_at,
    updated_at,
    deleted_at,
    name,
    family_name,
    nick_name,
    email,
    matricule,
    age,
    birth_date,
    sex,
    status,
    profile_image_xid,
});
