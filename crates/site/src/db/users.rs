//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use nearby_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    last_sign_in_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            email,
            name: r.name,
            image: r.image,
            created_at: r.created_at,
            last_sign_in_at: r.last_sign_in_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, image, created_at, last_sign_in_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Insert or refresh a user after a successful sign-in.
    ///
    /// Updates the profile fields and `last_sign_in_at` when the e-mail is
    /// already known.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_sign_in(
        &self,
        email: &Email,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, name, image)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, users.name),
                image = COALESCE(EXCLUDED.image, users.image),
                last_sign_in_at = NOW()
            RETURNING id, email, name, image, created_at, last_sign_in_at
            ",
        )
        .bind(email)
        .bind(name)
        .bind(image)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }
}
