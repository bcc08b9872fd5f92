use std::collections::BTreeSet;

use async_trait::async_trait;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::CredentialStore;
use crate::user::errors::UserError;

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, UserError> {
    let id: Uuid = row.try_get("id").map_err(database_error)?;
    let username: String = row.try_get("username").map_err(database_error)?;
    let password_hash: String = row.try_get("password_hash").map_err(database_error)?;
    let roles: Vec<String> = row.try_get("roles").map_err(database_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(database_error)?;

    let roles = roles
        .iter()
        .map(|role| role.parse::<Role>())
        .collect::<Result<BTreeSet<_>, _>>()
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

    Ok(User {
        id: UserId(id),
        username: stored_username(username)?,
        password_hash,
        roles,
        created_at,
    })
}

/// A stored username that no longer validates is a data fault, not bad input.
fn stored_username(username: String) -> Result<Username, UserError> {
    Username::new(username)
        .map_err(|e| UserError::DatabaseError(format!("corrupt users row: {e}")))
}

fn database_error(e: sqlx::Error) -> UserError {
    UserError::DatabaseError(e.to_string())
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, roles, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn save(&self, user: User) -> Result<User, UserError> {
        let roles: Vec<String> = user.roles.iter().map(|role| role.to_string()).collect();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, roles, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(&user.password_hash)
        .bind(roles)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("users_username_key")
                {
                    return UserError::UsernameAlreadyExists(user.username.as_str().to_string());
                }
            }
            database_error(e)
        })?;

        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query(
            r#"
            SELECT id, username, password_hash, roles, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(user_from_row).collect()
    }
}
