//! Request types for chat operations.

use serde::Deserialize;

use crate::types::{ChatError, ChatResult};

/// Ask for the chat between the requester and `participants` (phone numbers).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveChatRequest {
    pub participants: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Client-side classification hint. Classification always follows the
    /// participant count; a disagreeing hint is only logged.
    #[serde(default)]
    pub is_group: Option<bool>,
}

/// [`ResolveChatRequest`] after trimming and de-duplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResolveRequest {
    /// Trimmed, non-blank identifiers in first-seen order without repeats.
    pub identifiers: Vec<String>,
    /// Trimmed name, `None` when absent or blank.
    pub name: Option<String>,
    pub is_group_hint: Option<bool>,
}

impl ResolveChatRequest {
    pub fn normalize(&self) -> NormalizedResolveRequest {
        let mut identifiers: Vec<String> = Vec::with_capacity(self.participants.len());
        for raw in &self.participants {
            let identifier = raw.trim();
            if !identifier.is_empty() && !identifiers.iter().any(|seen| seen == identifier) {
                identifiers.push(identifier.to_string());
            }
        }

        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        NormalizedResolveRequest {
            identifiers,
            name,
            is_group_hint: self.is_group,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameChatRequest {
    pub name: String,
}

impl RenameChatRequest {
    /// The trimmed new name; blank names are rejected.
    pub fn validated_name(&self) -> ChatResult<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ChatError::validation("chat name must not be blank"));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub chat_id: i64,
    pub content: String,
}

impl PostMessageRequest {
    /// The trimmed content; messages are never empty.
    pub fn validated_content(&self) -> ChatResult<String> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(ChatError::validation("message content must not be empty"));
        }
        Ok(content.to_string())
    }
}
