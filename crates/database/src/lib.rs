//! Messenger Database Crate
//!
//! Connection management, embedded migrations, entities and the repositories
//! the chat and auth services persist through. Uniqueness of direct chats and
//! group names is enforced here by schema constraints and surfaced as
//! [`DatabaseError::Conflict`].

use messenger_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::run_migrations;

pub use repos::{ChatRepository, MessageRepository, SessionRepository, UserRepository};

pub use entities::{
    Chat, ChatWithLastMessage, CreateChatRequest, CreateMessageRequest, CreateSessionRequest,
    CreateUserRequest, Message, Session, UpdateUserRequest, User, UserCredentials,
};

pub use types::{now_timestamp, Constraint, DatabaseError, DatabaseResult};

/// Open the pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
