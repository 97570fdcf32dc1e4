//! Repository for chat data access operations.

use std::collections::HashMap;

use crate::entities::{Chat, ChatWithLastMessage, CreateChatRequest, User};
use crate::repos::user_repository::{user_from_row, USER_COLUMNS};
use crate::types::{now_timestamp, DatabaseError, DatabaseResult};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};

const CHAT_COLUMNS: &str = "c.id, c.name, c.is_group, c.created_at, c.updated_at";

const LAST_MESSAGE_COLUMNS: &str = "
    (SELECT m.content FROM messages m WHERE m.chat_id = c.id
        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message,
    (SELECT m.created_at FROM messages m WHERE m.chat_id = c.id
        ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message_at";

fn chat_from_row(row: &SqliteRow, participants: Vec<User>) -> DatabaseResult<Chat> {
    Ok(Chat {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        is_group: row.try_get("is_group")?,
        participants,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Repository for chat database operations
#[derive(Clone)]
pub struct ChatRepository {
    pool: SqlitePool,
}

impl ChatRepository {
    /// Create a new chat repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the chat row and all participant rows in one transaction.
    ///
    /// A direct chat whose `direct_key` already exists fails with
    /// `Conflict(DirectChatParticipants)`; a group whose name is taken fails
    /// with `Conflict(GroupName)`. Nothing is written in either case.
    pub async fn create(&self, request: &CreateChatRequest) -> DatabaseResult<Chat> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO chats (name, is_group, direct_key, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.name)
        .bind(request.is_group)
        .bind(&request.direct_key)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let chat_id = result.last_insert_rowid();

        for user_id in &request.participant_ids {
            sqlx::query(
                "INSERT INTO chat_participants (chat_id, user_id, joined_at) VALUES (?, ?, ?)",
            )
            .bind(chat_id)
            .bind(*user_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            chat_id,
            is_group = request.is_group,
            participants = request.participant_ids.len(),
            "created new chat"
        );

        self.find_by_id(chat_id)
            .await?
            .ok_or_else(|| DatabaseError::InternalError(format!("chat {chat_id} vanished after insert")))
    }

    pub async fn find_by_id(&self, chat_id: i64) -> DatabaseResult<Option<Chat>> {
        let row = sqlx::query(&format!("SELECT {CHAT_COLUMNS} FROM chats c WHERE c.id = ?"))
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut participants = self.participants_for(&[chat_id]).await?;
        let chat = chat_from_row(&row, participants.remove(&chat_id).unwrap_or_default())?;
        Ok(Some(chat))
    }

    /// Find the direct chat whose participant signature equals `direct_key`.
    pub async fn find_direct_by_key(&self, direct_key: &str) -> DatabaseResult<Option<Chat>> {
        let rows = sqlx::query("SELECT id FROM chats WHERE is_group = 0 AND direct_key = ? ORDER BY id")
            .bind(direct_key)
            .fetch_all(&self.pool)
            .await?;

        // The UNIQUE index on direct_key makes a second row impossible.
        debug_assert!(rows.len() <= 1, "duplicate direct chats for key {direct_key}");

        match rows.first() {
            Some(row) => {
                let chat_id: i64 = row.try_get("id")?;
                self.find_by_id(chat_id).await
            }
            None => Ok(None),
        }
    }

    /// Whether a group other than `exclude_chat_id` already uses `name`.
    pub async fn group_name_exists(&self, name: &str, exclude_chat_id: Option<i64>) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM chats WHERE is_group = 1 AND name = ? AND (? IS NULL OR id != ?)
             )",
        )
        .bind(name)
        .bind(exclude_chat_id)
        .bind(exclude_chat_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Rename a group chat and refresh `updated_at`. Direct chats are never touched.
    pub async fn rename(&self, chat_id: i64, name: &str) -> DatabaseResult<Chat> {
        let result = sqlx::query(
            "UPDATE chats SET name = ?, updated_at = ? WHERE id = ? AND is_group = 1",
        )
        .bind(name)
        .bind(now_timestamp())
        .bind(chat_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("group chat {chat_id}")));
        }

        info!(chat_id, name, "renamed chat");

        self.find_by_id(chat_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("chat {chat_id}")))
    }

    /// Add `user_id` to the chat. Returns `false` when the user was already a participant.
    pub async fn add_participant(&self, chat_id: i64, user_id: i64) -> DatabaseResult<bool> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO chat_participants (chat_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let added = result.rows_affected() > 0;
        if added {
            sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
                .bind(&now)
                .bind(chat_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        if added {
            info!(chat_id, user_id, "participant joined chat");
        } else {
            debug!(chat_id, user_id, "participant already present");
        }
        Ok(added)
    }

    /// Every chat `user_id` participates in, newest first, with its latest message.
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<ChatWithLastMessage>> {
        let rows = sqlx::query(&format!(
            "SELECT {CHAT_COLUMNS}, {LAST_MESSAGE_COLUMNS}
             FROM chats c
             JOIN chat_participants cp ON cp.chat_id = c.id
             WHERE cp.user_id = ?
             ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let chat_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut participants = self.participants_for(&chat_ids).await?;

        rows.iter()
            .map(|row| -> DatabaseResult<ChatWithLastMessage> {
                let chat_id: i64 = row.try_get("id")?;
                Ok(ChatWithLastMessage {
                    chat: chat_from_row(row, participants.remove(&chat_id).unwrap_or_default())?,
                    last_message: row.try_get("last_message")?,
                    last_message_at: row.try_get("last_message_at")?,
                })
            })
            .collect()
    }

    /// Chats of `user_id` whose stored name contains `query`, ignoring case.
    ///
    /// Direct chats have no stored name, so they never match.
    pub async fn search_for_user(&self, user_id: i64, query: &str) -> DatabaseResult<Vec<ChatWithLastMessage>> {
        let needle = query.to_lowercase();
        let chats = self.list_for_user(user_id).await?;

        let matches: Vec<_> = chats
            .into_iter()
            .filter(|entry| {
                !entry.chat.name.is_empty() && entry.chat.name.to_lowercase().contains(&needle)
            })
            .collect();

        debug!(user_id, query, matches = matches.len(), "searched chats");
        Ok(matches)
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<Chat>> {
        let rows = sqlx::query(&format!("SELECT {CHAT_COLUMNS} FROM chats c ORDER BY c.id"))
            .fetch_all(&self.pool)
            .await?;

        let chat_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut participants = self.participants_for(&chat_ids).await?;

        rows.iter()
            .map(|row| -> DatabaseResult<Chat> {
                let chat_id: i64 = row.try_get("id")?;
                chat_from_row(row, participants.remove(&chat_id).unwrap_or_default())
            })
            .collect()
    }

    async fn participants_for(&self, chat_ids: &[i64]) -> DatabaseResult<HashMap<i64, Vec<User>>> {
        let mut grouped: HashMap<i64, Vec<User>> = HashMap::new();
        if chat_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT cp.chat_id, {USER_COLUMNS}
             FROM chat_participants cp
             JOIN users u ON u.id = cp.user_id
             WHERE cp.chat_id IN ("
        ));
        let mut separated = builder.separated(", ");
        for chat_id in chat_ids {
            separated.push_bind(*chat_id);
        }
        separated.push_unseparated(") ORDER BY cp.chat_id, cp.joined_at, u.id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        for row in &rows {
            let chat_id: i64 = row.try_get("chat_id")?;
            grouped.entry(chat_id).or_default().push(user_from_row(row)?);
        }
        Ok(grouped)
    }
}
