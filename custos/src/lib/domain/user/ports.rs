use async_trait::async_trait;

use crate::domain::token::TokenClaims;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::LoginOutcome;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserInfo;
use crate::user::errors::AuthError;
use crate::user::errors::DirectoryError;

/// Port for authentication operations exposed to transports.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Raw username, email and plaintext password
    ///
    /// # Returns
    /// Public view of the created user
    ///
    /// # Errors
    /// * `InvalidInput` - A field violates the credential policy
    /// * `UserAlreadyExists` - Username or email is already taken
    /// * `Internal` - Hashing or persistence failed
    async fn register(&self, command: RegisterCommand) -> Result<UserInfo, AuthError>;

    /// Verify credentials and issue an access token.
    ///
    /// # Arguments
    /// * `command` - Username and plaintext password
    ///
    /// # Returns
    /// Token pair plus the public view of the user
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown user, inactive account or wrong password
    /// * `Internal` - Directory, hashing or signing failed
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AuthError>;

    /// Verify a bearer token and return its claims.
    ///
    /// # Errors
    /// * `TokenExpired` - Token is past its expiry
    /// * `TokenInvalid` - Any other validation failure
    async fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Persistence operations the authentication service relies on.
///
/// Implementations must enforce username and email uniqueness in `create`
/// itself; the existence checks are advisory.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Check whether a user with this exact username exists.
    ///
    /// # Errors
    /// * `DatabaseError` - Storage operation failed
    async fn exists_by_username(&self, username: &str) -> Result<bool, DirectoryError>;

    /// Check whether a user with this exact email exists.
    ///
    /// # Errors
    /// * `DatabaseError` - Storage operation failed
    async fn exists_by_email(&self, email: &str) -> Result<bool, DirectoryError>;

    /// Persist a new user and assign its identifier.
    ///
    /// # Arguments
    /// * `user` - User record without an ID
    ///
    /// # Returns
    /// Stored user entity
    ///
    /// # Errors
    /// * `Duplicate` - Username or email collided with an existing record
    /// * `DatabaseError` - Storage operation failed
    async fn create(&self, user: NewUser) -> Result<User, DirectoryError>;

    /// Retrieve a user by username.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `CorruptRecord` - Stored row cannot be mapped to a user
    /// * `DatabaseError` - Storage operation failed
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError>;
}
