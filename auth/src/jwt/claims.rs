use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Registered (RFC 7519) claims every issued token carries.
///
/// Services flatten this into their own claim type and add private fields
/// next to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredClaims {
    /// Issuer
    pub iss: String,

    /// Subject (user/entity identifier)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl RegisteredClaims {
    /// Stamp claims valid from `now` until `now + ttl`.
    ///
    /// # Arguments
    /// * `issuer` - Value for `iss`
    /// * `subject` - Value for `sub`
    /// * `now` - Issuance instant, used for both `iat` and `nbf`
    /// * `ttl` - Lifetime of the token
    pub fn issue(
        issuer: impl Into<String>,
        subject: impl ToString,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let issued_at = now.timestamp();

        Self {
            iss: issuer.into(),
            sub: subject.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: (now + ttl).timestamp(),
        }
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    /// Check if token is used before its `nbf` instant.
    pub fn is_not_yet_valid(&self, current_timestamp: i64) -> bool {
        current_timestamp < self.nbf
    }
}

/// Claim types that embed [`RegisteredClaims`].
///
/// Lets [`crate::JwtHandler`] enforce the time window on any payload.
pub trait WithRegisteredClaims {
    fn registered_claims(&self) -> &RegisteredClaims;
}

impl WithRegisteredClaims for RegisteredClaims {
    fn registered_claims(&self) -> &RegisteredClaims {
        self
    }
}
