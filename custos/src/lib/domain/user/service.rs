use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use chrono::Utc;
use tokio::sync::OnceCell;

use crate::domain::token::TokenClaims;
use crate::domain::token::TokenService;
use crate::domain::user::models::CredentialPolicy;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::LoginOutcome;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::UserInfo;
use crate::user::errors::AuthError;
use crate::user::errors::UniqueField;
use crate::user::ports::AuthServicePort;
use crate::user::ports::UserDirectory;

/// Password hashed once per process and verified against when the username
/// is unknown, so both login failure paths pay for one verification.
const DUMMY_PASSWORD: &str = "custos-dummy-password";

/// Domain service implementation for registration and login.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<D>
where
    D: UserDirectory,
{
    directory: Arc<D>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    policy: CredentialPolicy,
    dummy_hash: OnceCell<String>,
}

impl<D> AuthService<D>
where
    D: UserDirectory,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `directory` - User persistence implementation
    /// * `tokens` - Token issuer and verifier
    /// * `hasher` - Credential hasher with its cost parameters
    /// * `policy` - Username and password length bounds
    pub fn new(
        directory: Arc<D>,
        tokens: Arc<TokenService>,
        hasher: PasswordHasher,
        policy: CredentialPolicy,
    ) -> Self {
        Self {
            directory,
            tokens,
            hasher,
            policy,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();

        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))??;

        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();

        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))??;

        Ok(matches)
    }

    async fn verify_against_dummy(&self, password: String) -> Result<(), AuthError> {
        let dummy_hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
            .await?
            .clone();

        self.verify_password(password, dummy_hash).await?;
        Ok(())
    }
}

#[async_trait]
impl<D> AuthServicePort for AuthService<D>
where
    D: UserDirectory,
{
    async fn register(&self, command: RegisterCommand) -> Result<UserInfo, AuthError> {
        self.policy.validate(&command)?;

        if self.directory.exists_by_username(&command.username).await? {
            return Err(AuthError::UserAlreadyExists {
                field: UniqueField::Username,
                value: command.username,
            });
        }

        if self.directory.exists_by_email(&command.email).await? {
            return Err(AuthError::UserAlreadyExists {
                field: UniqueField::Email,
                value: command.email,
            });
        }

        let password_hash = self.hash_password(command.password).await?;
        let new_user = NewUser::registered(command.username, command.email, password_hash, Utc::now());

        // A concurrent registration can slip past the checks above; the
        // directory's unique constraint reports it as a conflict.
        let user = self.directory.create(new_user).await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            "User registered"
        );

        Ok(UserInfo::from(&user))
    }

    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, AuthError> {
        let user = match self.directory.get_by_username(&command.username).await? {
            Some(user) => user,
            None => {
                self.verify_against_dummy(command.password).await?;
                tracing::warn!(
                    username = %command.username,
                    reason = "unknown_user",
                    "Login rejected"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.is_active() {
            self.verify_against_dummy(command.password).await?;
            tracing::warn!(
                user_id = %user.id,
                username = %user.username,
                status = %user.status,
                reason = "inactive_account",
                "Login rejected"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let matches = self
            .verify_password(command.password, user.password_hash.clone())
            .await?;

        if !matches {
            tracing::warn!(
                user_id = %user.id,
                username = %user.username,
                reason = "password_mismatch",
                "Login rejected"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, &user.username, user.role)?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            "User logged in"
        );

        Ok(LoginOutcome {
            token,
            user: UserInfo::from(&user),
        })
    }

    async fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.tokens.parse(token)
    }
}
