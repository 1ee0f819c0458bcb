//! Domain services. Each one wraps the shared store handle and owns the SQL
//! for its feature; handlers build a service per request.

pub mod address_service;
pub mod authorization_service;
pub mod code_service;
pub mod education_service;
pub mod mark_service;
pub mod password_service;
pub mod planning_service;
pub mod qr_service;
pub mod session_service;
pub mod user_service;
pub mod validate;

use thiserror::Error;

use crate::auth::TokenError;
use crate::database::DatabaseError;

pub use address_service::AddressService;
pub use authorization_service::AuthorizationService;
pub use code_service::CodeService;
pub use education_service::EducationService;
pub use mark_service::MarkService;
pub use password_service::PasswordService;
pub use planning_service::PlanningService;
pub use qr_service::QrService;
pub use session_service::{Session, SessionService};
pub use user_service::UserService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Already used: {0}")]
    AlreadyUsed(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }
}
