use std::collections::BTreeMap;
use std::fmt;

use auth::JwtError;
use auth::PasswordError;
use serde::Serialize;
use thiserror::Error;

/// Fields the directory keeps unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by user directory implementations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// A unique constraint rejected the write.
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: UniqueField, value: String },

    #[error("Stored user record is invalid: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Top-level error for authentication operations.
///
/// Carries a stable machine-readable [`code`](AuthError::code), a message safe
/// to show callers and optional per-field detail. `Internal` wraps
/// infrastructure failures; its detail is for logs only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("User with {field} '{value}' already exists")]
    UserAlreadyExists { field: UniqueField, value: String },

    /// Unknown user, wrong password and inactive account all collapse here.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Stable code for transports and clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidInput { .. } => "INVALID_INPUT",
            AuthError::UserAlreadyExists { .. } => "USER_ALREADY_EXISTS",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenInvalid => "TOKEN_INVALID",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to return to callers.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Name of the offending field, if the error is about one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AuthError::InvalidInput { field, .. } => Some(*field),
            AuthError::UserAlreadyExists { field, .. } => Some(field.as_str()),
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::Internal(_) => None,
        }
    }

    /// Per-field detail for the response body.
    pub fn fields(&self) -> Option<BTreeMap<String, String>> {
        let detail = match self {
            AuthError::InvalidInput { field, message } => (field.to_string(), message.clone()),
            AuthError::UserAlreadyExists { field, .. } => {
                (field.to_string(), "already taken".to_string())
            }
            _ => return None,
        };
        Some(BTreeMap::from([detail]))
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Duplicate { field, value } => {
                AuthError::UserAlreadyExists { field, value }
            }
            DirectoryError::CorruptRecord(_) | DirectoryError::DatabaseError(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => AuthError::TokenExpired,
            JwtError::TokenNotYetValid
            | JwtError::DecodingFailed(_)
            | JwtError::InvalidToken(_)
            | JwtError::MissingClaim(_) => AuthError::TokenInvalid,
            JwtError::EmptySecret
            | JwtError::UnsupportedAlgorithm(_)
            | JwtError::EncodingFailed(_) => AuthError::Internal(err.to_string()),
        }
    }
}
