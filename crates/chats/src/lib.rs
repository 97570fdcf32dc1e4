//! # Messenger Chats Crate
//!
//! Chat identity and access rules for the Messenger backend.
//!
//! - [`ChatResolver`] maps "the requester plus these phone numbers" to one
//!   canonical chat, reusing direct chats with an identical participant set
//!   and classifying chats with more than two participants as groups.
//! - [`AccessGate`] decides what a user may see of a chat and which
//!   mutations (rename, join, post, like) they may perform.
//! - [`ChatService`] and [`MessageService`] combine both with persistence.
//!
//! ## Usage
//!
//! ```rust,no_run
//! # async fn demo(pool: sqlx::SqlitePool, me: messenger_chats::User) -> messenger_chats::ChatResult<()> {
//! use messenger_chats::{ChatService, ResolveChatRequest};
//!
//! let service = ChatService::new(pool);
//! let request = ResolveChatRequest {
//!     participants: vec!["+2".into()],
//!     ..Default::default()
//! };
//! let resolved = service.resolve_chat(&me, &request).await?;
//! assert!(!resolved.chat.is_group);
//! # Ok(())
//! # }
//! ```

pub mod entities;
pub mod services;
pub mod types;
pub mod utils;

pub use entities::{Chat, ChatWithLastMessage, Message, ParticipantSet, User};
pub use services::{ChatResolver, ChatService, MessageService};
pub use types::{
    ChatDetail, ChatError, ChatResult, ChatSummary, ChatView, GroupPreview, JoinOutcome,
    MessageView, NormalizedResolveRequest, PostMessageRequest, RenameChatRequest,
    ResolveChatRequest, ResolvedChat,
};
pub use utils::{AccessGate, Authorization, MutationKind, Visibility};
