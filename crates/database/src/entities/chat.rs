//! Chat entity definitions

use serde::{Deserialize, Serialize};

use super::user::User;

/// A conversation with its full participant list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// Empty for direct chats.
    pub name: String,
    pub is_group: bool,
    pub participants: Vec<User>,
    pub created_at: String,
    pub updated_at: String,
}

impl Chat {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.participants.iter().any(|user| user.id == user_id)
    }

    pub fn participant_phone_numbers(&self) -> Vec<String> {
        self.participants
            .iter()
            .map(|user| user.phone_number.clone())
            .collect()
    }

    /// Title as seen by `viewer_id`: the chat name, or the other participant's
    /// phone number for unnamed chats.
    pub fn title_for(&self, viewer_id: i64) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.participants
            .iter()
            .find(|user| user.id != viewer_id)
            .map(|user| user.phone_number.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// A chat plus the newest message, as shown in chat lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatWithLastMessage {
    pub chat: Chat,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
}

/// Insert request. `direct_key` must be set for direct chats and absent for groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub name: String,
    pub is_group: bool,
    pub direct_key: Option<String>,
    pub participant_ids: Vec<i64>,
}
