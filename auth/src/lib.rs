//! Authentication utilities library
//!
//! Provides reusable credential primitives for services:
//! - Password hashing (Argon2id) with tunable cost
//! - HMAC-only JWT signing and validation
//! - An injectable clock for token time windows
//!
//! Each service defines its own claim and error types and adapts these implementations.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## JWT Tokens
//! ```
//! use auth::{JwtHandler, RegisteredClaims};
//! use chrono::{Duration, Utc};
//!
//! let handler = JwtHandler::hs256(b"secret_key_at_least_32_bytes_long!")
//!     .unwrap()
//!     .with_issuer("custos");
//! let claims = RegisteredClaims::issue("custos", "user123", Utc::now(), Duration::minutes(15));
//! let token = handler.encode(&claims).unwrap();
//! let decoded: RegisteredClaims = handler.decode(&token).unwrap();
//! assert_eq!(decoded.sub, "user123");
//! ```

pub mod clock;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::RegisteredClaims;
pub use jwt::WithRegisteredClaims;
pub use password::HashingParams;
pub use password::PasswordError;
pub use password::PasswordHasher;
