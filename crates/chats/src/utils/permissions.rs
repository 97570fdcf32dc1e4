//! Membership-gated access rules.
//!
//! [`AccessGate`] is pure: it reasons over a loaded [`Chat`] and a user id and
//! never touches storage, so every rule here is unit-testable.

use crate::entities::Chat;
use crate::types::{ChatError, ChatResult};

/// How much of a chat a user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Participant: metadata, participants and every message.
    Full,
    /// Non-participant of a group: metadata and participants, no messages.
    Preview,
    /// Non-participant of a direct chat.
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Rename,
    Join,
    PostMessage,
    ToggleLike,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Forbidden(&'static str),
    InvalidOperation(&'static str),
}

impl Authorization {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn into_result(self) -> ChatResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Forbidden(reason) => Err(ChatError::forbidden(reason)),
            Self::InvalidOperation(reason) => Err(ChatError::invalid_operation(reason)),
        }
    }
}

pub struct AccessGate;

impl AccessGate {
    pub fn visibility(user_id: i64, chat: &Chat) -> Visibility {
        if chat.has_participant(user_id) {
            Visibility::Full
        } else if chat.is_group {
            Visibility::Preview
        } else {
            Visibility::Denied
        }
    }

    pub fn authorize_mutation(user_id: i64, chat: &Chat, kind: MutationKind) -> Authorization {
        let participant = chat.has_participant(user_id);

        match kind {
            MutationKind::Rename => match (participant, chat.is_group) {
                (false, _) => Authorization::Forbidden("only participants can rename a chat"),
                (true, false) => Authorization::InvalidOperation("direct chats cannot be renamed"),
                (true, true) => Authorization::Allowed,
            },
            // Joining a group you already belong to is a no-op success.
            MutationKind::Join if chat.is_group => Authorization::Allowed,
            MutationKind::Join => Authorization::InvalidOperation("direct chats cannot be joined"),
            MutationKind::PostMessage if participant => Authorization::Allowed,
            MutationKind::PostMessage => {
                Authorization::Forbidden("only participants can post messages")
            }
            MutationKind::ToggleLike if participant => Authorization::Allowed,
            MutationKind::ToggleLike => Authorization::Forbidden("only participants can like messages"),
        }
    }
}
