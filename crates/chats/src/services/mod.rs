//! Business logic services for the chat system.
//!
//! [`ChatResolver`] owns chat identity; [`ChatService`] and
//! [`MessageService`] consult [`crate::utils::AccessGate`] before every read
//! or mutation.

pub mod chat_service;
pub mod message_service;
pub mod resolver;

pub use chat_service::ChatService;
pub use message_service::MessageService;
pub use resolver::ChatResolver;
