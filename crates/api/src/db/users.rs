//! Database operations for user accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sugarloaf_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::User;

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("user {}: invalid email: {e}", row.id))
        })?;
        let role = row.role.parse::<Role>().map_err(|_| {
            RepositoryError::DataCorruption(format!("user {}: invalid role '{}'", row.id, row.role))
        })?;
        Ok(Self { id: UserId::new(row.id), email, role, created_at: row.created_at })
    }
}

/// Repository for user account operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO shop.\"user\" (email, password_hash, role) \
             VALUES ($1, $2, $3) \
             RETURNING id, email, role, created_at",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict("email is already registered".to_string())
            }
            _ => RepositoryError::Database(e),
        })?;

        row.try_into()
    }

    /// Fetch an account and its password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn get_by_email_with_hash(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<(i32, String, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, email, role, password_hash, created_at \
             FROM shop.\"user\" WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.pool)
        .await?;

        let Some((id, email, role, password_hash, created_at)) = row else {
            return Ok(None);
        };
        let user = UserRow { id, email, role, created_at }.try_into()?;
        Ok(Some((user, password_hash)))
    }

    /// Fetch an account by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on query failure.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, role, created_at FROM shop.\"user\" WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}
