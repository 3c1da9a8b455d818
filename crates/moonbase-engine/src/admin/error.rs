use std::fmt;

use crate::driver::DriverError;

/// Errors from user and API-key management.
///
/// Most variants carry a symbolic code surfaced in the error envelope's
/// `error_code` field; `code()` returns it.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AdminError {
    MissingField { field: String },
    InvalidFieldValue { field: String, reason: String },
    InvalidRole { value: String },
    InvalidEmail { value: String },
    WeakPassword { reason: String },
    AdminRequired,
    CannotModifySelf,
    CannotDeleteLastAdmin,
    UserNotFound { id: String },
    UsernameExists { username: String },
    EmailExists { email: String },
    ApiKeyNotFound { id: String },
    ApiKeyNameExists { name: String },
    InvalidKeyName { name: String },
    InvalidAction { action: String },
    InvalidCredentials,
    Driver(DriverError),
}

impl AdminError {
    /// The symbolic error code for the response envelope.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { .. } => Some("MISSING_REQUIRED_FIELD"),
            Self::InvalidFieldValue { .. } => Some("INVALID_FIELD_VALUE"),
            Self::InvalidRole { .. } => Some("INVALID_ROLE"),
            Self::InvalidEmail { .. } => Some("INVALID_EMAIL_FORMAT"),
            Self::WeakPassword { .. } => Some("WEAK_PASSWORD"),
            Self::AdminRequired => Some("ADMIN_REQUIRED"),
            Self::CannotModifySelf => Some("CANNOT_MODIFY_SELF"),
            Self::CannotDeleteLastAdmin => Some("CANNOT_DELETE_LAST_ADMIN"),
            Self::UserNotFound { .. } => Some("USER_NOT_FOUND"),
            Self::UsernameExists { .. } => Some("USERNAME_EXISTS"),
            Self::EmailExists { .. } => Some("EMAIL_EXISTS"),
            Self::ApiKeyNotFound { .. } => Some("APIKEY_NOT_FOUND"),
            Self::ApiKeyNameExists { .. } => Some("APIKEY_NAME_EXISTS"),
            Self::InvalidKeyName { .. } => Some("INVALID_KEY_NAME"),
            Self::InvalidAction { .. } => Some("INVALID_ACTION"),
            Self::InvalidCredentials => None,
            Self::Driver(_) => None,
        }
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingField { .. }
            | Self::InvalidFieldValue { .. }
            | Self::InvalidRole { .. }
            | Self::InvalidEmail { .. }
            | Self::WeakPassword { .. }
            | Self::InvalidKeyName { .. }
            | Self::InvalidAction { .. } => 400,
            Self::InvalidCredentials => 401,
            Self::AdminRequired | Self::CannotModifySelf | Self::CannotDeleteLastAdmin => 403,
            Self::UserNotFound { .. } | Self::ApiKeyNotFound { .. } => 404,
            Self::UsernameExists { .. }
            | Self::EmailExists { .. }
            | Self::ApiKeyNameExists { .. } => 409,
            Self::Driver(_) => 500,
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required field '{field}'"),
            Self::InvalidFieldValue { field, reason } => {
                write!(f, "invalid value for '{field}': {reason}")
            }
            Self::InvalidRole { value } => {
                write!(f, "invalid role '{value}': expected 'admin' or 'user'")
            }
            Self::InvalidEmail { value } => write!(f, "invalid email address '{value}'"),
            Self::WeakPassword { reason } => write!(f, "password too weak: {reason}"),
            Self::AdminRequired => write!(f, "admin role required"),
            Self::CannotModifySelf => {
                write!(f, "admins cannot modify or delete their own account here")
            }
            Self::CannotDeleteLastAdmin => {
                write!(f, "the last remaining admin cannot be demoted or deleted")
            }
            Self::UserNotFound { id } => write!(f, "user '{id}' not found"),
            Self::UsernameExists { username } => {
                write!(f, "username '{username}' is already taken")
            }
            Self::EmailExists { email } => write!(f, "email '{email}' is already registered"),
            Self::ApiKeyNotFound { id } => write!(f, "api key '{id}' not found"),
            Self::ApiKeyNameExists { name } => {
                write!(f, "api key name '{name}' is already taken")
            }
            Self::InvalidKeyName { name } => write!(f, "invalid api key name '{name}'"),
            Self::InvalidAction { action } => write!(f, "invalid action '{action}'"),
            Self::InvalidCredentials => write!(f, "invalid username or password"),
            Self::Driver(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AdminError {}

impl From<DriverError> for AdminError {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}
