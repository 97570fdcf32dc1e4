//! Message entity definitions

use serde::{Deserialize, Serialize};

use super::user::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub author: User,
    pub content: String,
    pub created_at: String,
    pub liked_by: Vec<User>,
}

impl Message {
    pub fn is_liked_by(&self, user_id: i64) -> bool {
        self.liked_by.iter().any(|user| user.id == user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub chat_id: i64,
    pub author_id: i64,
    pub content: String,
}
