use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserDirectory;
use crate::user::errors::DirectoryError;
use crate::user::errors::UniqueField;

const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";

pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape of the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    nickname: String,
    avatar: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DirectoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = u64::try_from(row.id)
            .map_err(|_| DirectoryError::CorruptRecord(format!("negative user id {}", row.id)))?;

        Ok(User {
            id: UserId(id),
            role: row.role.parse().map_err(DirectoryError::CorruptRecord)?,
            status: row.status.parse().map_err(DirectoryError::CorruptRecord)?,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            nickname: row.nickname,
            avatar: row.avatar,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_insert_error(err: sqlx::Error, user: &NewUser) -> DirectoryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => {
                    return DirectoryError::Duplicate {
                        field: UniqueField::Username,
                        value: user.username.clone(),
                    }
                }
                Some(EMAIL_CONSTRAINT) => {
                    return DirectoryError::Duplicate {
                        field: UniqueField::Email,
                        value: user.email.clone(),
                    }
                }
                _ => {}
            }
        }
    }
    DirectoryError::DatabaseError(err.to_string())
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn exists_by_username(&self, username: &str) -> Result<bool, DirectoryError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DirectoryError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DirectoryError::DatabaseError(e.to_string()))
    }

    async fn create(&self, user: NewUser) -> Result<User, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users
                (username, email, password_hash, nickname, avatar, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id, username, email, password_hash, nickname, avatar, role, status,
                      created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(&user.avatar)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &user))?;

        User::try_from(row)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, nickname, avatar, role, status,
                   created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DirectoryError::DatabaseError(e.to_string()))?;

        row.map(User::try_from).transpose()
    }
}
