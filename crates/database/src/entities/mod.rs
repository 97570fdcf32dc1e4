//! Domain entities for the database layer

pub mod chat;
pub mod message;
pub mod session;
pub mod user;

pub use chat::{Chat, ChatWithLastMessage, CreateChatRequest};
pub use message::{CreateMessageRequest, Message};
pub use session::{CreateSessionRequest, Session};
pub use user::{CreateUserRequest, UpdateUserRequest, User, UserCredentials};
