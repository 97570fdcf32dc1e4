//! Chat service for managing chat operations.

use messenger_database::{ChatRepository, Constraint, MessageRepository};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::entities::{Chat, User};
use crate::services::ChatResolver;
use crate::types::{
    ChatDetail, ChatError, ChatResult, ChatSummary, ChatView, GroupPreview, JoinOutcome,
    MessageView, RenameChatRequest, ResolveChatRequest, ResolvedChat,
};
use crate::utils::{AccessGate, MutationKind, Visibility};

/// Service for managing chat operations
#[derive(Clone)]
pub struct ChatService {
    chats: ChatRepository,
    messages: MessageRepository,
    resolver: ChatResolver,
}

impl ChatService {
    /// Create a new chat service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            chats: ChatRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            resolver: ChatResolver::new(pool),
        }
    }

    /// Return the canonical chat for the requester and `request.participants`, creating it if needed.
    pub async fn resolve_chat(&self, requester: &User, request: &ResolveChatRequest) -> ChatResult<ResolvedChat> {
        self.resolver.resolve(requester, request).await
    }

    /// Chats the user participates in, newest first.
    pub async fn list_chats(&self, user_id: i64) -> ChatResult<Vec<ChatSummary>> {
        let entries = self.chats.list_for_user(user_id).await?;
        Ok(entries
            .iter()
            .map(|entry| ChatSummary::for_viewer(entry, user_id))
            .collect())
    }

    /// The user's chats whose name contains `query`, ignoring case.
    pub async fn search_chats(&self, user_id: i64, query: &str) -> ChatResult<Vec<ChatSummary>> {
        let entries = self.chats.search_for_user(user_id, query.trim()).await?;
        Ok(entries
            .iter()
            .map(|entry| ChatSummary::for_viewer(entry, user_id))
            .collect())
    }

    pub async fn view_chat(&self, user_id: i64, chat_id: i64) -> ChatResult<ChatView> {
        let chat = self.load_chat(chat_id).await?;

        let view = match AccessGate::visibility(user_id, &chat) {
            Visibility::Full => {
                let messages = self.messages.list_for_chat(chat.id).await?;
                ChatView::FullDetail(ChatDetail {
                    chat_id: chat.id,
                    title: chat.title_for(user_id),
                    is_group: chat.is_group,
                    participants: chat.participant_phone_numbers(),
                    messages: messages
                        .iter()
                        .map(|message| MessageView::for_viewer(message, user_id))
                        .collect(),
                })
            }
            Visibility::Preview => {
                debug!(user_id, chat_id, "serving group preview to non-participant");
                ChatView::RedactedGroupPreview(GroupPreview {
                    chat_id: chat.id,
                    participants: chat.participant_phone_numbers(),
                    name: chat.name,
                })
            }
            Visibility::Denied => {
                warn!(user_id, chat_id, "non-participant asked for direct chat");
                ChatView::Forbidden
            }
        };

        Ok(view)
    }

    pub async fn rename_chat(&self, user_id: i64, chat_id: i64, request: &RenameChatRequest) -> ChatResult<Chat> {
        let chat = self.load_chat(chat_id).await?;
        AccessGate::authorize_mutation(user_id, &chat, MutationKind::Rename).into_result()?;

        let name = request.validated_name()?;
        if name == chat.name {
            return Ok(chat);
        }

        if self.chats.group_name_exists(&name, Some(chat.id)).await? {
            return Err(ChatError::duplicate_group_name(name));
        }

        match self.chats.rename(chat.id, &name).await {
            Ok(renamed) => Ok(renamed),
            Err(error) if error.conflict() == Some(Constraint::GroupName) => {
                Err(ChatError::duplicate_group_name(name))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Add the user to a group chat. Joining twice succeeds without changes.
    pub async fn join_chat(&self, user_id: i64, chat_id: i64) -> ChatResult<JoinOutcome> {
        let chat = self.load_chat(chat_id).await?;
        AccessGate::authorize_mutation(user_id, &chat, MutationKind::Join).into_result()?;

        if chat.has_participant(user_id) {
            debug!(user_id, chat_id, "join requested by existing participant");
            return Ok(JoinOutcome::AlreadyMember(chat));
        }

        let added = self.chats.add_participant(chat.id, user_id).await?;
        let chat = self.load_chat(chat_id).await?;

        if added {
            info!(user_id, chat_id, "user joined group chat");
            Ok(JoinOutcome::Joined(chat))
        } else {
            Ok(JoinOutcome::AlreadyMember(chat))
        }
    }

    async fn load_chat(&self, chat_id: i64) -> ChatResult<Chat> {
        self.chats
            .find_by_id(chat_id)
            .await?
            .ok_or_else(|| ChatError::chat_not_found(chat_id))
    }
}
