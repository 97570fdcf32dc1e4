//! Response types for chat operations.

use messenger_database::{Chat, ChatWithLastMessage, Message, User};
use serde::Serialize;

/// Outcome of resolving a chat: the canonical chat and whether this call created it.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedChat {
    pub chat: Chat,
    pub created: bool,
}

/// What a user may see of a chat.
///
/// Only the variant a viewer is entitled to is ever built, so a preview can
/// never carry messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ChatView {
    FullDetail(ChatDetail),
    RedactedGroupPreview(GroupPreview),
    Forbidden,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatDetail {
    pub chat_id: i64,
    /// The chat name, or the other participant's phone number for direct chats.
    pub title: String,
    pub is_group: bool,
    pub participants: Vec<String>,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupPreview {
    pub chat_id: i64,
    pub name: String,
    pub participants: Vec<String>,
}

/// A message as seen by one viewer.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub chat_id: i64,
    pub author: User,
    pub content: String,
    pub created_at: String,
    pub liked: bool,
    pub liked_by: Vec<String>,
}

impl MessageView {
    pub fn for_viewer(message: &Message, viewer_id: i64) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            author: message.author.clone(),
            content: message.content.clone(),
            created_at: message.created_at.clone(),
            liked: message.is_liked_by(viewer_id),
            liked_by: message
                .liked_by
                .iter()
                .map(|user| user.display_label().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum JoinOutcome {
    Joined(Chat),
    AlreadyMember(Chat),
}

impl JoinOutcome {
    pub fn chat(&self) -> &Chat {
        match self {
            Self::Joined(chat) | Self::AlreadyMember(chat) => chat,
        }
    }
}

/// A chat list entry.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub chat_id: i64,
    pub title: String,
    pub is_group: bool,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
}

impl ChatSummary {
    pub fn for_viewer(entry: &ChatWithLastMessage, viewer_id: i64) -> Self {
        Self {
            chat_id: entry.chat.id,
            title: entry.chat.title_for(viewer_id),
            is_group: entry.chat.is_group,
            last_message: entry.last_message.clone(),
            last_message_at: entry.last_message_at.clone(),
        }
    }
}
