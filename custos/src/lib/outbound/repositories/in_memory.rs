use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserDirectory;
use crate::user::errors::DirectoryError;
use crate::user::errors::UniqueField;

/// Process-local directory for development and tests.
///
/// Uniqueness is checked and the record inserted under one write lock, so
/// concurrent `create` calls cannot both claim the same username or email.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> DirectoryError {
        DirectoryError::DatabaseError("user directory lock poisoned".to_string())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn exists_by_username(&self, username: &str) -> Result<bool, DirectoryError> {
        let users = self.users.read().map_err(Self::poisoned)?;
        Ok(users.iter().any(|user| user.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DirectoryError> {
        let users = self.users.read().map_err(Self::poisoned)?;
        Ok(users.iter().any(|user| user.email == email))
    }

    async fn create(&self, user: NewUser) -> Result<User, DirectoryError> {
        let mut users = self.users.write().map_err(Self::poisoned)?;

        if users.iter().any(|existing| existing.username == user.username) {
            return Err(DirectoryError::Duplicate {
                field: UniqueField::Username,
                value: user.username,
            });
        }
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(DirectoryError::Duplicate {
                field: UniqueField::Email,
                value: user.email,
            });
        }

        let id = UserId(users.len() as u64 + 1);
        let created = user.into_user(id);
        users.push(created.clone());

        Ok(created)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let users = self.users.read().map_err(Self::poisoned)?;
        Ok(users.iter().find(|user| user.username == username).cloned())
    }
}
