pub mod claims;
pub mod errors;
pub mod handler;

pub use claims::RegisteredClaims;
pub use claims::WithRegisteredClaims;
pub use errors::JwtError;
pub use handler::JwtHandler;
pub use handler::HMAC_ALGORITHMS;
