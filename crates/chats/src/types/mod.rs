//! Shared request, response and error types for the chat system.

pub mod errors;
pub mod requests;
pub mod responses;

pub use errors::{ChatError, ChatResult};
pub use requests::{NormalizedResolveRequest, PostMessageRequest, RenameChatRequest, ResolveChatRequest};
pub use responses::{
    ChatDetail, ChatSummary, ChatView, GroupPreview, JoinOutcome, MessageView, ResolvedChat,
};
