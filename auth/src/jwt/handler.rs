use std::sync::Arc;

use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::claims::WithRegisteredClaims;
use super::errors::JwtError;
use crate::clock::Clock;
use crate::clock::SystemClock;

/// Signature algorithms accepted when decoding.
///
/// Every token must be signed with a symmetric HMAC algorithm; anything else
/// (`none`, RSA, EC, ...) is refused before the signature is looked at.
pub const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type to allow services to define their own token payload.
/// Signs with a shared secret using an HMAC algorithm (HS256 unless told otherwise).
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: Option<String>,
    clock: Arc<dyn Clock>,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    /// * `algorithm` - Signing algorithm, must be one of [`HMAC_ALGORITHMS`]
    ///
    /// # Errors
    /// * `EmptySecret` - Secret has zero length
    /// * `UnsupportedAlgorithm` - Algorithm is not HMAC based
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::EmptySecret);
        }
        if !HMAC_ALGORITHMS.contains(&algorithm) {
            return Err(JwtError::UnsupportedAlgorithm(format!("{:?}", algorithm)));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            issuer: None,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create an HS256 handler.
    pub fn hs256(secret: &[u8]) -> Result<Self, JwtError> {
        Self::new(secret, Algorithm::HS256)
    }

    /// Only accept tokens whose `iss` claim equals `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Check `nbf`/`exp` against `clock` instead of wall-clock time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// Checks, in order: structure, algorithm family, signature, required
    /// claims (`exp`, `nbf`, `sub`, plus `iss` when an issuer is set), issuer,
    /// then the `nbf`/`exp` window against the handler's clock with no leeway.
    ///
    /// # Errors
    /// * `DecodingFailed` - Token is malformed
    /// * `InvalidToken` - Wrong algorithm, bad signature or wrong issuer
    /// * `MissingClaim` - A required registered claim is absent
    /// * `TokenNotYetValid` - Current time is before `nbf`
    /// * `TokenExpired` - Current time is after `exp`
    pub fn decode<T>(&self, token: &str) -> Result<T, JwtError>
    where
        T: DeserializeOwned + WithRegisteredClaims,
    {
        let token_data =
            decode::<T>(token, &self.decoding_key, &self.validation()).map_err(map_decode_error)?;
        let claims = token_data.claims;

        let now = self.clock.now().timestamp();
        let registered = claims.registered_claims();
        if registered.is_not_yet_valid(now) {
            return Err(JwtError::TokenNotYetValid);
        }
        if registered.is_expired(now) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        // Time window is checked against our own clock in `decode`.
        validation.validate_exp = false;
        validation.validate_nbf = false;

        match &self.issuer {
            Some(issuer) => {
                validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);
                validation.set_issuer(&[issuer]);
            }
            None => validation.set_required_spec_claims(&["exp", "nbf", "sub"]),
        }

        validation
    }
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> JwtError {
    match error.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::ImmatureSignature => JwtError::TokenNotYetValid,
        ErrorKind::MissingRequiredClaim(claim) => JwtError::MissingClaim(claim.clone()),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            JwtError::DecodingFailed(error.to_string())
        }
        _ => JwtError::InvalidToken(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::TimeZone;
    use chrono::Utc;
    use serde::Deserialize;

    use super::*;
    use crate::clock::FixedClock;
    use crate::jwt::claims::RegisteredClaims;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        role: String,
        #[serde(flatten)]
        registered: RegisteredClaims,
    }

    impl WithRegisteredClaims for TestClaims {
        fn registered_claims(&self) -> &RegisteredClaims {
            &self.registered
        }
    }

    fn fresh_claims() -> TestClaims {
        TestClaims {
            role: "admin".to_string(),
            registered: RegisteredClaims::issue(
                "test-issuer",
                "user123",
                Utc::now(),
                Duration::minutes(15),
            ),
        }
    }

    fn replace_header(token: &str, header: &str) -> String {
        let mut parts = token.splitn(2, '.');
        let _ = parts.next();
        format!("{}.{}", header, parts.next().unwrap())
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::hs256(SECRET).unwrap();
        let claims = fresh_claims();

        // Encode
        let token = handler.encode(&claims).expect("Failed to encode token");
        assert!(!token.is_empty());
        assert_eq!(token.split('.').count(), 3);

        // Decode
        let decoded: TestClaims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_rejects_empty_secret() {
        assert!(matches!(
            JwtHandler::hs256(b""),
            Err(JwtError::EmptySecret)
        ));
    }

    #[test]
    fn test_rejects_non_hmac_algorithm() {
        let result = JwtHandler::new(SECRET, Algorithm::RS256);
        assert!(matches!(result, Err(JwtError::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = JwtHandler::hs256(SECRET).unwrap();

        let result = handler.decode::<TestClaims>("invalid.token.here");
        assert!(matches!(result, Err(JwtError::DecodingFailed(_))));
    }

    #[test]
    fn test_decode_empty_token() {
        let handler = JwtHandler::hs256(SECRET).unwrap();
        assert!(handler.decode::<TestClaims>("").is_err());
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = JwtHandler::hs256(b"secret1_at_least_32_bytes_long_key!").unwrap();
        let handler2 = JwtHandler::hs256(b"secret2_at_least_32_bytes_long_key!").unwrap();

        let token = handler1
            .encode(&fresh_claims())
            .expect("Failed to encode token");

        // Try to decode with different secret
        let result = handler2.decode::<TestClaims>(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_tampered_signature() {
        let handler = JwtHandler::hs256(SECRET).unwrap();
        let token = handler.encode(&fresh_claims()).unwrap();

        let (unsigned, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

        let result = handler.decode::<TestClaims>(&tampered);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_accepts_other_hmac_algorithms() {
        let signer = JwtHandler::new(SECRET, Algorithm::HS512).unwrap();
        let verifier = JwtHandler::hs256(SECRET).unwrap();

        let token = signer.encode(&fresh_claims()).unwrap();
        assert!(verifier.decode::<TestClaims>(&token).is_ok());
    }

    #[test]
    fn test_rejects_asymmetric_algorithm_header() {
        let handler = JwtHandler::hs256(SECRET).unwrap();
        let token = handler.encode(&fresh_claims()).unwrap();

        // {"alg":"RS256","typ":"JWT"}
        let forged = replace_header(&token, "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9");

        let result = handler.decode::<TestClaims>(&forged);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_rejects_none_algorithm_header() {
        let handler = JwtHandler::hs256(SECRET).unwrap();
        let token = handler.encode(&fresh_claims()).unwrap();

        // {"alg":"none","typ":"JWT"}
        let forged = replace_header(&token, "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0");

        assert!(handler.decode::<TestClaims>(&forged).is_err());
    }

    #[test]
    fn test_rejects_wrong_issuer() {
        let signer = JwtHandler::hs256(SECRET).unwrap();
        let verifier = JwtHandler::hs256(SECRET).unwrap().with_issuer("someone-else");

        let token = signer.encode(&fresh_claims()).unwrap();
        let result = verifier.decode::<TestClaims>(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_accepts_matching_issuer() {
        let handler = JwtHandler::hs256(SECRET).unwrap().with_issuer("test-issuer");

        let token = handler.encode(&fresh_claims()).unwrap();
        assert!(handler.decode::<TestClaims>(&token).is_ok());
    }

    #[test]
    fn test_expired_token() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let claims = TestClaims {
            role: "user".to_string(),
            registered: RegisteredClaims::issue("test-issuer", "u1", issued, Duration::minutes(5)),
        };

        let handler = JwtHandler::hs256(SECRET)
            .unwrap()
            .with_clock(Arc::new(FixedClock(issued + Duration::minutes(6))));
        let token = handler.encode(&claims).unwrap();

        assert_eq!(
            handler.decode::<TestClaims>(&token),
            Err(JwtError::TokenExpired)
        );
    }

    #[test]
    fn test_token_valid_at_exact_expiry() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let claims = RegisteredClaims::issue("test-issuer", "u1", issued, Duration::minutes(5));

        let handler = JwtHandler::hs256(SECRET)
            .unwrap()
            .with_clock(Arc::new(FixedClock(issued + Duration::minutes(5))));
        let token = handler.encode(&claims).unwrap();

        assert!(handler.decode::<RegisteredClaims>(&token).is_ok());
    }

    #[test]
    fn test_token_used_before_not_before() {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let claims = RegisteredClaims::issue("test-issuer", "u1", issued, Duration::minutes(5));

        let handler = JwtHandler::hs256(SECRET)
            .unwrap()
            .with_clock(Arc::new(FixedClock(issued - Duration::seconds(1))));
        let token = handler.encode(&claims).unwrap();

        assert_eq!(
            handler.decode::<RegisteredClaims>(&token),
            Err(JwtError::TokenNotYetValid)
        );
    }

    #[test]
    fn test_missing_registered_claim() {
        #[derive(Serialize)]
        struct Bare {
            sub: String,
        }

        let handler = JwtHandler::hs256(SECRET).unwrap();
        let token = handler
            .encode(&Bare {
                sub: "u1".to_string(),
            })
            .unwrap();

        let result = handler.decode::<RegisteredClaims>(&token);
        assert!(matches!(
            result,
            Err(JwtError::MissingClaim(_)) | Err(JwtError::DecodingFailed(_))
        ));
    }
}
