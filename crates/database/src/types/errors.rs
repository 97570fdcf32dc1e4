//! Error types for the database layer

use thiserror::Error;

/// Unique constraints the schema uses to keep chats and users canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Two direct chats with the same participant signature.
    DirectChatParticipants,
    /// Two group chats with the same name.
    GroupName,
    PhoneNumber,
}

impl Constraint {
    /// Decode SQLite's `UNIQUE constraint failed: <table>.<column>` message.
    fn from_message(message: &str) -> Option<Self> {
        if message.contains("chats.direct_key") {
            Some(Self::DirectChatParticipants)
        } else if message.contains("chats.name") {
            Some(Self::GroupName)
        } else if message.contains("users.phone_number") {
            Some(Self::PhoneNumber)
        } else {
            None
        }
    }
}

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0:?}")]
    Conflict(Constraint),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DatabaseError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    /// The violated constraint, if this error is a uniqueness conflict.
    pub fn conflict(&self) -> Option<Constraint> {
        match self {
            Self::Conflict(constraint) => Some(*constraint),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                if let Some(constraint) = Constraint::from_message(db_error.message()) {
                    return Self::Conflict(constraint);
                }
            }
        }
        Self::QueryError(error.to_string())
    }
}
