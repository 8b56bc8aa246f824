use std::sync::Arc;
use std::time::Duration;

use auth::Clock;
use auth::JwtError;
use auth::JwtHandler;
use auth::RegisteredClaims;
use auth::SystemClock;
use auth::WithRegisteredClaims;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;
use crate::user::errors::AuthError;

/// Token type label returned with every issued token.
pub const TOKEN_TYPE: &str = "Bearer";

/// Immutable token configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenSettingsError {
    #[error("Token lifetime must be between 1 second and {max} seconds, got {actual}")]
    InvalidTtl { max: i64, actual: u64 },

    #[error(transparent)]
    Jwt(#[from] JwtError),
}

/// Signed payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    #[serde(flatten)]
    pub registered: RegisteredClaims,
}

impl TokenClaims {
    pub fn issuer(&self) -> &str {
        &self.registered.iss
    }

    pub fn subject(&self) -> &str {
        &self.registered.sub
    }

    pub fn issued_at(&self) -> i64 {
        self.registered.iat
    }

    pub fn not_before(&self) -> i64 {
        self.registered.nbf
    }

    pub fn expires_at(&self) -> i64 {
        self.registered.exp
    }
}

impl WithRegisteredClaims for TokenClaims {
    fn registered_claims(&self) -> &RegisteredClaims {
        &self.registered
    }
}

/// Issued token handed to the caller; nothing is retained server side.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Issues and verifies stateless bearer tokens.
///
/// There is no revocation: a token stays valid until `exp` passes.
pub struct TokenService {
    jwt: JwtHandler,
    issuer: String,
    ttl_seconds: i64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Maximum accepted lifetime, one year.
    const MAX_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

    /// Build a token service reading the wall clock.
    ///
    /// # Errors
    /// * `InvalidTtl` - Lifetime is zero or longer than a year
    /// * `Jwt` - Secret is empty
    pub fn new(settings: &TokenSettings) -> Result<Self, TokenSettingsError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Build a token service that stamps and checks time with `clock`.
    pub fn with_clock(
        settings: &TokenSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenSettingsError> {
        let ttl_seconds = i64::try_from(settings.ttl.as_secs())
            .ok()
            .filter(|secs| (1..=Self::MAX_TTL_SECONDS).contains(secs))
            .ok_or(TokenSettingsError::InvalidTtl {
                max: Self::MAX_TTL_SECONDS,
                actual: settings.ttl.as_secs(),
            })?;

        let jwt = JwtHandler::hs256(settings.secret.as_bytes())?
            .with_issuer(settings.issuer.clone())
            .with_clock(Arc::clone(&clock));

        Ok(Self {
            jwt,
            issuer: settings.issuer.clone(),
            ttl_seconds,
            clock,
        })
    }

    /// Issue a token for a user.
    ///
    /// `iat` and `nbf` are set to now, `exp` to now plus the configured ttl.
    ///
    /// # Errors
    /// * `Internal` - Signing failed
    pub fn issue(
        &self,
        user_id: UserId,
        username: &str,
        role: Role,
    ) -> Result<TokenPair, AuthError> {
        let claims = TokenClaims {
            user_id,
            username: username.to_string(),
            role,
            registered: RegisteredClaims::issue(
                self.issuer.as_str(),
                user_id,
                self.clock.now(),
                chrono::Duration::seconds(self.ttl_seconds),
            ),
        };

        let access_token = self.jwt.encode(&claims)?;

        Ok(TokenPair {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.ttl_seconds,
        })
    }

    /// Verify a token's signature, algorithm, issuer and time window.
    ///
    /// # Errors
    /// * `TokenExpired` - Current time is past `exp`
    /// * `TokenInvalid` - Malformed, tampered, wrong algorithm or issuer,
    ///   not yet valid, or subject not matching the user ID
    pub fn parse(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims: TokenClaims = self.jwt.decode(token)?;

        if claims.subject() != claims.user_id.to_string() {
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }
}
