/// Credential store
///
/// Exact-match username lookup plus bcrypt verification. The lookup
/// path burns the same bcrypt cost whether or not the username exists,
/// so authentication failures do not leak account existence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use crate::auth::{hash_password, verify_password, DUMMY_HASH};
use crate::error::AppError;
use crate::validators::{is_valid_username, MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH};

/// User role, stored as text with a CHECK constraint on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        // The CHECK constraint admits only these two values; anything
        // else degrades to the least privileged role.
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// A stored user. The password hash never leaves this module.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Create a user. Role defaults to `user` at the call sites that take
/// external input; only internal callers hand in `admin`.
///
/// # Errors
/// - Validation error for a malformed username or password
/// - Duplicate username surfaces as a typed conflict (409), courtesy
///   of the unique constraint
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    password: &str,
    role: Role,
) -> Result<User, AppError> {
    let username = is_valid_username(username)?;
    let password_hash = hash_password(password)?;

    let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
        r#"
        INSERT INTO users (username, password_hash, role)
        VALUES ($1, $2, $3)
        RETURNING id, created_at
        "#,
    )
    .bind(&username)
    .bind(&password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    tracing::info!(user_id = id, username = %username, "User created");

    Ok(User {
        id,
        username,
        role,
        created_at,
    })
}

/// Authenticate by username and password.
///
/// Returns `Ok(None)` for unknown username and for wrong password
/// alike; the two paths do the same bcrypt work. The login handler
/// adds a fixed latency floor on top.
pub async fn authenticate(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let username = username.trim();

    // Out-of-bounds names cannot match a stored row; still burn the
    // bcrypt cost so the outcome is not observable through timing.
    if username.len() < MIN_USERNAME_LENGTH || username.len() > MAX_USERNAME_LENGTH {
        let _ = verify_password(password, DUMMY_HASH);
        return Ok(None);
    }

    let row = sqlx::query_as::<_, (i64, String, String, String, DateTime<Utc>)>(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match row {
        None => {
            let _ = verify_password(password, DUMMY_HASH);
            Ok(None)
        }
        Some((id, username, password_hash, role, created_at)) => {
            if verify_password(password, &password_hash) {
                Ok(Some(User {
                    id,
                    username,
                    role: Role::from(role.as_str()),
                    created_at,
                }))
            } else {
                tracing::warn!(username = %username, "Failed login attempt");
                Ok(None)
            }
        }
    }
}

/// Fetch a user by exact username.
pub async fn get_user(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, (i64, String, String, DateTime<Utc>)>(
        "SELECT id, username, role, created_at FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, username, role, created_at)| User {
        id,
        username,
        role: Role::from(role.as_str()),
        created_at,
    }))
}

/// All users, oldest first. Admin-only at the HTTP layer.
pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query_as::<_, (i64, String, String, DateTime<Utc>)>(
        "SELECT id, username, role, created_at FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, username, role, created_at)| User {
            id,
            username,
            role: Role::from(role.as_str()),
            created_at,
        })
        .collect())
}
