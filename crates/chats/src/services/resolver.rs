//! Resolve-or-create for chats.
//!
//! Given a requester and the phone numbers they want to talk to, the resolver
//! returns the one canonical chat for that participant set: an existing
//! direct chat with exactly the same participants, or a newly created direct
//! or group chat. Uniqueness is backed by schema constraints; the lookups here
//! only avoid a failed insert in the common case.

use messenger_database::{
    ChatRepository, Constraint, CreateChatRequest, DatabaseError, UserRepository,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::entities::{ParticipantSet, User};
use crate::types::{ChatError, ChatResult, ResolveChatRequest, ResolvedChat};

#[derive(Clone)]
pub struct ChatResolver {
    users: UserRepository,
    chats: ChatRepository,
}

impl ChatResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            chats: ChatRepository::new(pool),
        }
    }

    pub async fn resolve(&self, requester: &User, request: &ResolveChatRequest) -> ChatResult<ResolvedChat> {
        let request = request.normalize();

        let resolved = self.users.find_by_phone_numbers(&request.identifiers).await?;
        let unknown: Vec<String> = request
            .identifiers
            .iter()
            .filter(|identifier| !resolved.iter().any(|user| &user.phone_number == *identifier))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            debug!(requester_id = requester.id, ?unknown, "chat request names unknown participants");
            return Err(ChatError::unknown_participants(unknown));
        }

        let mut participants: ParticipantSet = resolved.iter().map(|user| user.id).collect();
        participants.insert(requester.id);

        if participants.len() < 2 {
            return Err(ChatError::EmptyParticipantSet);
        }

        let is_group = participants.is_group();
        if let Some(hint) = request.is_group_hint {
            if hint != is_group {
                debug!(
                    requester_id = requester.id,
                    hint,
                    is_group,
                    "ignoring group flag that disagrees with participant count"
                );
            }
        }

        if is_group {
            self.create_group(participants, request.name).await
        } else {
            if request.name.is_some() {
                debug!(requester_id = requester.id, "ignoring name supplied for direct chat");
            }
            self.resolve_direct(participants).await
        }
    }

    async fn resolve_direct(&self, participants: ParticipantSet) -> ChatResult<ResolvedChat> {
        let key = participants.signature();

        if let Some(chat) = self.chats.find_direct_by_key(&key).await? {
            debug!(chat_id = chat.id, "reusing existing direct chat");
            return Ok(ResolvedChat { chat, created: false });
        }

        let request = CreateChatRequest {
            name: String::new(),
            is_group: false,
            direct_key: Some(key.clone()),
            participant_ids: participants.ids(),
        };

        match self.chats.create(&request).await {
            Ok(chat) => Ok(ResolvedChat { chat, created: true }),
            Err(error) if error.conflict() == Some(Constraint::DirectChatParticipants) => {
                // A concurrent request created the chat first; hand back theirs.
                let chat = self.chats.find_direct_by_key(&key).await?.ok_or_else(|| {
                    DatabaseError::InternalError(format!("direct chat {key} missing after conflict"))
                })?;
                info!(chat_id = chat.id, "direct chat created concurrently, reusing it");
                Ok(ResolvedChat { chat, created: false })
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn create_group(&self, participants: ParticipantSet, name: Option<String>) -> ChatResult<ResolvedChat> {
        let name = name.ok_or(ChatError::MissingGroupName)?;

        if self.chats.group_name_exists(&name, None).await? {
            return Err(ChatError::duplicate_group_name(name));
        }

        let request = CreateChatRequest {
            name: name.clone(),
            is_group: true,
            direct_key: None,
            participant_ids: participants.ids(),
        };

        match self.chats.create(&request).await {
            Ok(chat) => Ok(ResolvedChat { chat, created: true }),
            Err(error) if error.conflict() == Some(Constraint::GroupName) => {
                Err(ChatError::duplicate_group_name(name))
            }
            Err(error) => Err(error.into()),
        }
    }
}
