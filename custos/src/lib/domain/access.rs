use serde::Serialize;
use thiserror::Error;

use crate::domain::token::TokenClaims;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;
use crate::user::errors::AuthError;
use crate::user::ports::AuthServicePort;

/// Scheme literal expected in front of the token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity resolved from a verified token, attached to the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        }
    }
}

impl Identity {
    /// Allow iff the attached role equals `expected`.
    pub fn require_role(&self, expected: Role) -> Result<(), AccessError> {
        if self.role == expected {
            Ok(())
        } else {
            Err(AccessError::InsufficientPermissions {
                required: expected,
                actual: self.role,
            })
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("Authorization header is required")]
    MissingAuthorization,

    #[error("Authorization header must use the Bearer scheme")]
    InvalidAuthorizationFormat,

    #[error(transparent)]
    Token(AuthError),

    #[error("No authenticated identity on the request")]
    MissingIdentity,

    #[error("Role '{required}' is required")]
    InsufficientPermissions { required: Role, actual: Role },
}

impl AccessError {
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::MissingAuthorization => "MISSING_AUTHORIZATION",
            AccessError::InvalidAuthorizationFormat => "INVALID_AUTHORIZATION_FORMAT",
            AccessError::Token(err) => err.code(),
            AccessError::MissingIdentity => "MISSING_USER_ROLE",
            AccessError::InsufficientPermissions { .. } => "INSUFFICIENT_PERMISSIONS",
        }
    }

    /// Forbidden means the caller is known but lacks the role; everything
    /// else is unauthenticated.
    pub fn is_forbidden(&self) -> bool {
        match self {
            AccessError::InsufficientPermissions { .. } => true,
            AccessError::MissingAuthorization
            | AccessError::InvalidAuthorizationFormat
            | AccessError::Token(_)
            | AccessError::MissingIdentity => false,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            AccessError::Token(err) => err.public_message(),
            other => other.to_string(),
        }
    }
}

/// Extract the raw token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AccessError> {
    let value = header.ok_or(AccessError::MissingAuthorization)?;

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AccessError::InvalidAuthorizationFormat),
    }
}

/// Resolve the caller's identity from an `Authorization` header value.
///
/// # Errors
/// * `MissingAuthorization` / `InvalidAuthorizationFormat` - Header absent or malformed
/// * `Token` - Token expired or failed verification
pub async fn authenticate(
    header: Option<&str>,
    auth_service: &dyn AuthServicePort,
) -> Result<Identity, AccessError> {
    let token = bearer_token(header)?;

    let claims = auth_service
        .validate_token(token)
        .await
        .map_err(AccessError::Token)?;

    Ok(Identity::from(claims))
}

/// Role gate for a request that may or may not carry an identity.
pub fn require_role(identity: Option<&Identity>, expected: Role) -> Result<(), AccessError> {
    identity
        .ok_or(AccessError::MissingIdentity)?
        .require_role(expected)
}
