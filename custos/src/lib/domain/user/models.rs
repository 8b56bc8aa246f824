use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::token::TokenPair;
use crate::user::errors::AuthError;

/// User aggregate entity.
///
/// Username and email are unique across the directory and never change once
/// the record exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub avatar: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        match self.status {
            UserStatus::Active => true,
            UserStatus::Inactive | UserStatus::Suspended => false,
        }
    }
}

/// User record that has not been persisted yet; the directory assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub avatar: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Build a freshly registered user with default role and status.
    ///
    /// # Arguments
    /// * `username` - Validated username (also used as initial nickname)
    /// * `email` - Validated email address
    /// * `password_hash` - PHC string produced by the password hasher
    /// * `now` - Creation instant
    pub fn registered(
        username: String,
        email: String,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            nickname: username.clone(),
            username,
            email,
            password_hash,
            avatar: String::new(),
            role: Role::User,
            status: UserStatus::Active,
            created_at: now,
        }
    }

    /// Attach the directory-assigned identifier.
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            nickname: self.nickname,
            avatar: self.avatar,
            role: self.role,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authorization role attached to every user and every issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Account lifecycle status. Only active accounts may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "suspended" => Ok(UserStatus::Suspended),
            other => Err(format!("unknown user status '{}'", other)),
        }
    }
}

/// Inclusive length range, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: &str) -> bool {
        let length = value.chars().count();
        length >= self.min && length <= self.max
    }
}

/// Registration rules for usernames and passwords.
///
/// Only lengths are checked; there are no character-class requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    pub username: LengthBounds,
    pub password: LengthBounds,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            username: LengthBounds::new(3, 50),
            password: LengthBounds::new(8, 128),
        }
    }
}

impl CredentialPolicy {
    /// Check a registration request against the policy.
    ///
    /// Fields are checked in order username, password, email; the first
    /// violation wins.
    ///
    /// # Errors
    /// * `InvalidInput` - A field violates the policy
    pub fn validate(&self, command: &RegisterCommand) -> Result<(), AuthError> {
        if !self.username.contains(&command.username) {
            return Err(AuthError::invalid_input(
                "username",
                format!(
                    "Username must be between {} and {} characters",
                    self.username.min, self.username.max
                ),
            ));
        }

        if !self.password.contains(&command.password) {
            return Err(AuthError::invalid_input(
                "password",
                format!(
                    "Password must be between {} and {} characters",
                    self.password.min, self.password.max
                ),
            ));
        }

        if let Err(e) = email_address::EmailAddress::from_str(&command.email) {
            return Err(AuthError::invalid_input(
                "email",
                format!("Invalid email address: {}", e),
            ));
        }

        Ok(())
    }
}

/// Raw registration input.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Raw login input. Lives only for the duration of the login call.
#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

impl LoginCommand {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub avatar: String,
    pub role: Role,
    pub status: UserStatus,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            avatar: user.avatar.clone(),
            role: user.role,
            status: user.status,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: TokenPair,
    pub user: UserInfo,
}
