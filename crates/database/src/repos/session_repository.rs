//! Session repository for database operations.

use crate::entities::{CreateSessionRequest, Session};
use crate::types::{now_timestamp, DatabaseResult};
use sqlx::{Row, SqlitePool};

/// Repository for bearer session rows
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateSessionRequest) -> DatabaseResult<Session> {
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&request.token)
        .bind(request.user_id)
        .bind(&now)
        .bind(&request.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(Session {
            token: request.token.clone(),
            user_id: request.user_id,
            created_at: now,
            expires_at: request.expires_at.clone(),
        })
    }

    pub async fn find_by_token(&self, token: &str) -> DatabaseResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Session {
                token: row.try_get("token")?,
                user_id: row.try_get("user_id")?,
                created_at: row.try_get("created_at")?,
                expires_at: row.try_get("expires_at")?,
            })),
            None => Ok(None),
        }
    }

    pub async fn delete(&self, token: &str) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove sessions whose expiry lies before `now` (RFC 3339). Returns the count removed.
    pub async fn delete_expired(&self, now: &str) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
