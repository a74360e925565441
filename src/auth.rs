use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::UserId;
use crate::state::AppState;

/// Resolves the identity behind a request, or `None` when the request is
/// unauthenticated.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<UserId>, AppError>;
}

/// Looks up `Authorization: Token <key>` (or `Bearer <key>`) in the
/// `auth_tokens` table.
pub struct TokenAuthenticator {
    db: SqlitePool,
}

impl TokenAuthenticator {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Option<UserId>, AppError> {
        let Some(key) = token_from_headers(headers) else {
            return Ok(None);
        };

        let user = sqlx::query_scalar::<_, UserId>(
            r#"
            SELECT u.id
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = ?1 AND u.is_active = 1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        if user.is_none() {
            debug!("rejected unknown or inactive token");
        }
        Ok(user)
    }
}

pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, key) = value.trim().split_once(' ')?;
    let key = key.trim();

    let known_scheme = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    if !known_scheme || key.is_empty() || key.contains(' ') {
        return None;
    }
    Some(key)
}

/// The authenticated requester. Rejects with `Unauthorized` before the
/// handler body (and any store access) runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state
            .auth
            .authenticate(&parts.headers)
            .await?
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Returns the user's id, creating an active user when the name is new.
pub async fn ensure_user(db: &SqlitePool, username: &str) -> Result<UserId, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("username must not be empty".to_string()));
    }

    if let Some(id) = sqlx::query_scalar::<_, UserId>("SELECT id FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(db)
        .await?
    {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (username, is_active, created_at) VALUES (?1, 1, ?2) RETURNING id",
    )
    .bind(username)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;

    info!("created user {} ({})", username, id);
    Ok(id)
}

pub async fn issue_token(db: &SqlitePool, user: UserId) -> Result<String, AppError> {
    let key = Uuid::new_v4().simple().to_string();

    sqlx::query("INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)")
        .bind(&key)
        .bind(user)
        .bind(Utc::now())
        .execute(db)
        .await?;

    info!("issued token for user {}", user);
    Ok(key)
}

pub async fn revoke_tokens(db: &SqlitePool, user: UserId) -> Result<u64, AppError> {
    let revoked = sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?1")
        .bind(user)
        .execute(db)
        .await?
        .rows_affected();

    info!("revoked {} token(s) for user {}", revoked, user);
    Ok(revoked)
}

pub async fn set_user_active(db: &SqlitePool, user: UserId, active: bool) -> Result<(), AppError> {
    let affected = sqlx::query("UPDATE users SET is_active = ?1 WHERE id = ?2")
        .bind(active)
        .bind(user)
        .execute(db)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Removes the user; their todos and tokens go with them.
pub async fn delete_user(db: &SqlitePool, user: UserId) -> Result<(), AppError> {
    let affected = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user)
        .execute(db)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(AppError::NotFound);
    }
    info!("deleted user {}", user);
    Ok(())
}
