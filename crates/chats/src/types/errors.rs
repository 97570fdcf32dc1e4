//! Error types for the chat system.

use messenger_database::DatabaseError;
use thiserror::Error;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the chat system
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unknown participants: {}", identifiers.join(", "))]
    UnknownParticipant { identifiers: Vec<String> },

    #[error("A chat needs at least one participant besides the requester")]
    EmptyParticipantSet,

    #[error("Group chats with more than two participants need a name")]
    MissingGroupName,

    #[error("A group chat named '{name}' already exists")]
    DuplicateGroupName { name: String },

    #[error("Chat not found: {id}")]
    ChatNotFound { id: i64 },

    #[error("Message not found: {id}")]
    MessageNotFound { id: i64 },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid operation: {reason}")]
    InvalidOperation { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl ChatError {
    pub fn unknown_participants(identifiers: Vec<String>) -> Self {
        Self::UnknownParticipant { identifiers }
    }

    pub fn duplicate_group_name(name: impl Into<String>) -> Self {
        Self::DuplicateGroupName { name: name.into() }
    }

    pub fn chat_not_found(id: i64) -> Self {
        Self::ChatNotFound { id }
    }

    pub fn message_not_found(id: i64) -> Self {
        Self::MessageNotFound { id }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden { reason: reason.into() }
    }

    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation { reason: reason.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }
}
