//! Repository for message data access operations.

use std::collections::HashMap;

use crate::entities::{CreateMessageRequest, Message, User};
use crate::repos::user_repository::{user_from_row, USER_COLUMNS};
use crate::types::{now_timestamp, DatabaseError, DatabaseResult};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};

const MESSAGE_COLUMNS: &str =
    "m.id AS message_id, m.chat_id, m.content, m.created_at AS message_created_at";

fn message_from_row(row: &SqliteRow, liked_by: Vec<User>) -> DatabaseResult<Message> {
    Ok(Message {
        id: row.try_get("message_id")?,
        chat_id: row.try_get("chat_id")?,
        author: user_from_row(row)?,
        content: row.try_get("content")?,
        created_at: row.try_get("message_created_at")?,
        liked_by,
    })
}

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &CreateMessageRequest) -> DatabaseResult<Message> {
        let result = sqlx::query(
            "INSERT INTO messages (chat_id, author_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(request.chat_id)
        .bind(request.author_id)
        .bind(&request.content)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        let message_id = result.last_insert_rowid();
        info!(message_id, chat_id = request.chat_id, author_id = request.author_id, "stored message");

        self.find_by_id(message_id)
            .await?
            .ok_or_else(|| DatabaseError::InternalError(format!("message {message_id} vanished after insert")))
    }

    pub async fn find_by_id(&self, message_id: i64) -> DatabaseResult<Option<Message>> {
        let row = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS}, {USER_COLUMNS}
             FROM messages m JOIN users u ON u.id = m.author_id
             WHERE m.id = ?"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut likers = self.likers_for(&[message_id]).await?;
        let message = message_from_row(&row, likers.remove(&message_id).unwrap_or_default())?;
        Ok(Some(message))
    }

    /// All messages of a chat in ascending creation order, with their likers.
    pub async fn list_for_chat(&self, chat_id: i64) -> DatabaseResult<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS}, {USER_COLUMNS}
             FROM messages m JOIN users u ON u.id = m.author_id
             WHERE m.chat_id = ?
             ORDER BY m.created_at ASC, m.id ASC"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        let message_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("message_id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut likers = self.likers_for(&message_ids).await?;

        rows.iter()
            .map(|row| -> DatabaseResult<Message> {
                let message_id: i64 = row.try_get("message_id")?;
                message_from_row(row, likers.remove(&message_id).unwrap_or_default())
            })
            .collect()
    }

    /// Flip the like of `user_id` on a message. Returns the new state.
    ///
    /// The delete and the conditional insert share one write transaction, so
    /// concurrent toggles by the same user serialize on the primary key.
    pub async fn toggle_like(&self, message_id: i64, user_id: i64) -> DatabaseResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM message_likes WHERE message_id = ? AND user_id = ?")
            .bind(message_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = if removed > 0 {
            false
        } else {
            sqlx::query("INSERT INTO message_likes (message_id, user_id, created_at) VALUES (?, ?, ?)")
                .bind(message_id)
                .bind(user_id)
                .bind(now_timestamp())
                .execute(&mut *tx)
                .await?;
            true
        };

        tx.commit().await?;

        debug!(message_id, user_id, liked, "toggled like");
        Ok(liked)
    }

    /// Number of messages per chat. Chats without messages are absent.
    pub async fn count_by_chat(&self) -> DatabaseResult<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT chat_id, COUNT(*) FROM messages GROUP BY chat_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    async fn likers_for(&self, message_ids: &[i64]) -> DatabaseResult<HashMap<i64, Vec<User>>> {
        let mut grouped: HashMap<i64, Vec<User>> = HashMap::new();
        if message_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT ml.message_id, {USER_COLUMNS}
             FROM message_likes ml
             JOIN users u ON u.id = ml.user_id
             WHERE ml.message_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for message_id in message_ids {
            separated.push_bind(*message_id);
        }
        separated.push_unseparated(") ORDER BY ml.message_id, ml.created_at, u.id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        for row in &rows {
            let message_id: i64 = row.try_get("message_id")?;
            grouped.entry(message_id).or_default().push(user_from_row(row)?);
        }
        Ok(grouped)
    }
}
