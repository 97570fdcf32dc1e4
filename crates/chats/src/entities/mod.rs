//! Domain entities used by the chat services.

pub mod participant_set;

pub use messenger_database::{Chat, ChatWithLastMessage, Message, User};
pub use participant_set::ParticipantSet;
