use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::rest::health::health_check,
        crate::rest::auth::register,
        crate::rest::auth::login,
        crate::rest::auth::logout,
        crate::rest::profile::get_profile,
        crate::rest::profile::update_profile,
        crate::rest::profile::search_users,
        crate::rest::chat::list_chats,
        crate::rest::chat::resolve_chat,
        crate::rest::chat::search_chats,
        crate::rest::chat::view_chat,
        crate::rest::chat::rename_chat,
        crate::rest::chat::join_chat,
        crate::rest::message::create_message,
        crate::rest::message::toggle_like
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::rest::health::HealthResponse,
            crate::rest::auth::RegisterRequest,
            crate::rest::auth::RegisterResponse,
            crate::rest::auth::LoginRequest,
            crate::rest::auth::TokenResponse,
            crate::rest::profile::UserResponse,
            crate::rest::profile::UpdateProfileRequest,
            crate::rest::chat::ChatResponse,
            crate::rest::chat::ChatSummaryResponse,
            crate::rest::chat::ChatViewResponse,
            crate::rest::chat::ResolveChatBody,
            crate::rest::chat::RenameChatBody,
            crate::rest::chat::JoinChatResponse,
            crate::rest::message::MessageResponse,
            crate::rest::message::CreateMessageRequest,
            crate::rest::message::LikeResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Registration, login and sessions"),
        (name = "Profile", description = "Own profile and user search"),
        (name = "Chats", description = "Resolving, viewing, renaming and joining chats"),
        (name = "Messages", description = "Posting and liking messages")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("opaque".to_string());
        }

        components
            .security_schemes
            .insert("bearerAuth".to_string(), scheme);
    }
}
