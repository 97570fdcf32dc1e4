//! Message service: posting and liking, gated on chat participation.

use messenger_database::{ChatRepository, CreateMessageRequest, MessageRepository};
use sqlx::SqlitePool;
use tracing::info;

use crate::entities::{Chat, Message};
use crate::types::{ChatError, ChatResult, MessageView, PostMessageRequest};
use crate::utils::{AccessGate, MutationKind};

#[derive(Clone)]
pub struct MessageService {
    chats: ChatRepository,
    messages: MessageRepository,
}

impl MessageService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            chats: ChatRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
        }
    }

    pub async fn post_message(&self, author_id: i64, request: &PostMessageRequest) -> ChatResult<MessageView> {
        let content = request.validated_content()?;
        let chat = self.load_chat(request.chat_id).await?;
        AccessGate::authorize_mutation(author_id, &chat, MutationKind::PostMessage).into_result()?;

        let message = self
            .messages
            .create(&CreateMessageRequest {
                chat_id: chat.id,
                author_id,
                content,
            })
            .await?;

        info!(message_id = message.id, chat_id = chat.id, author_id, "message posted");
        Ok(MessageView::for_viewer(&message, author_id))
    }

    /// Like the message if the user has not, unlike it otherwise. Returns the new state.
    pub async fn toggle_like(&self, user_id: i64, message_id: i64) -> ChatResult<bool> {
        let message = self.load_message(message_id).await?;
        let chat = self.load_chat(message.chat_id).await?;
        AccessGate::authorize_mutation(user_id, &chat, MutationKind::ToggleLike).into_result()?;

        Ok(self.messages.toggle_like(message.id, user_id).await?)
    }

    async fn load_chat(&self, chat_id: i64) -> ChatResult<Chat> {
        self.chats
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| ChatError::chat_not_found(chat_id))
    }

    async fn load_message(&self, message_id: i64) -> ChatResult<Message> {
        self.messages
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| ChatError::message_not_found(message_id))
    }
}
