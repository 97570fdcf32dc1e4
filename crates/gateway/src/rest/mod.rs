//! REST API endpoints for the gateway

pub mod auth;
pub mod chat;
pub mod health;
pub mod message;
pub mod profile;

use axum::Router;

use crate::state::GatewayState;

/// All versioned API routes, relative to `/api/v1`.
pub fn create_rest_routes() -> Router<GatewayState> {
    Router::new()
        .merge(auth::create_auth_routes())
        .merge(profile::create_profile_routes())
        .merge(chat::create_chat_routes())
        .merge(message::create_message_routes())
}
