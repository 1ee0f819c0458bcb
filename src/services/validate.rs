use crate::database::models::Role;

use super::ServiceError;

/// bcrypt reads at most 72 bytes; 18 chars of up to 4 bytes each stays inside.
pub const MAX_PASSWORD_CHARS: usize = 18;

pub fn validate_email_format(email: &str) -> Result<(), ServiceError> {
    if email.is_empty() {
        return Err(ServiceError::validation("email", "Email cannot be empty"));
    }
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(ServiceError::validation("email", "Invalid email format"));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ServiceError::validation("email", "Invalid email format"));
    }

    let domain = parts[1];
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ServiceError::validation("email", "Invalid email format"));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.is_empty() {
        return Err(ServiceError::validation("password", "Password cannot be empty"));
    }
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(ServiceError::validation(
            "password",
            format!("Password must be at most {} characters", MAX_PASSWORD_CHARS),
        ));
    }
    Ok(())
}

/// Parses the `:as` registration path segment.
pub fn parse_role(raw: &str) -> Result<Role, ServiceError> {
    raw.parse::<i64>()
        .ok()
        .and_then(Role::from_code)
        .ok_or_else(|| ServiceError::validation("as", "Role must be 0 (student), 1 (parent), 2 (tutor) or 3 (professor)"))
}
