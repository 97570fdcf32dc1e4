//! Shared application state for the gateway

use std::sync::Arc;

use messenger_auth::{AuthSession, Authenticator};
use messenger_chats::{ChatService, MessageService, User};
use sqlx::SqlitePool;

use crate::error::GatewayResult;

/// Services shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct GatewayState {
    inner: Arc<Services>,
}

struct Services {
    authenticator: Authenticator,
    chat_service: ChatService,
    message_service: MessageService,
}

impl GatewayState {
    pub fn new(
        authenticator: Authenticator,
        chat_service: ChatService,
        message_service: MessageService,
    ) -> Self {
        Self {
            inner: Arc::new(Services {
                authenticator,
                chat_service,
                message_service,
            }),
        }
    }

    /// Build every service over one pool.
    pub fn from_pool(pool: SqlitePool, authenticator: Authenticator) -> Self {
        Self::new(
            authenticator,
            ChatService::new(pool.clone()),
            MessageService::new(pool),
        )
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    pub fn chat_service(&self) -> &ChatService {
        &self.inner.chat_service
    }

    pub fn message_service(&self) -> &MessageService {
        &self.inner.message_service
    }

    /// Resolve a bearer token to the signed-in user.
    pub async fn authenticate(&self, token: &str) -> GatewayResult<(User, AuthSession)> {
        Ok(self.inner.authenticator.authenticate_token(token).await?)
    }
}
