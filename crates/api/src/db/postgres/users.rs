//! User account queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shopfloor_core::{Email, UserId};

use super::{PgStore, map_write_error};
use crate::db::{RepositoryError, UserStore};
use crate::models::{User, UserCredentials};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    id: UserId,
    email: Email,
    created_at: DateTime<Utc>,
    password_hash: String,
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.app_user (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, created_at
            ",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r"
            SELECT id, email, created_at, password_hash
            FROM shop.app_user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|r| UserCredentials {
            user: User {
                id: r.id,
                email: r.email,
                created_at: r.created_at,
            },
            password_hash: r.password_hash,
        }))
    }
}
