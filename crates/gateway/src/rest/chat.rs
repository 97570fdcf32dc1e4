//! Chat REST endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use messenger_chats::{
    Chat, ChatSummary, ChatView, JoinOutcome, RenameChatRequest, ResolveChatRequest,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::current_user;
use crate::rest::message::MessageResponse;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub id: i64,
    pub name: String,
    pub is_group: bool,
    pub participants: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Chat> for ChatResponse {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id,
            name: chat.name.clone(),
            is_group: chat.is_group,
            participants: chat.participant_phone_numbers(),
            created_at: chat.created_at.clone(),
            updated_at: chat.updated_at.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatSummaryResponse {
    pub id: i64,
    pub title: String,
    pub is_group: bool,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
}

impl From<ChatSummary> for ChatSummaryResponse {
    fn from(summary: ChatSummary) -> Self {
        Self {
            id: summary.chat_id,
            title: summary.title,
            is_group: summary.is_group,
            last_message: summary.last_message,
            last_message_at: summary.last_message_at,
        }
    }
}

/// A chat as the requester may see it. `access` is false for a group preview,
/// in which case `messages` is always empty.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatViewResponse {
    pub access: bool,
    pub id: i64,
    pub title: String,
    pub is_group: bool,
    pub participants: Vec<String>,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveChatBody {
    pub participants: Vec<String>,
    pub name: Option<String>,
    pub is_group: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameChatBody {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinChatResponse {
    pub joined: bool,
    pub chat: ChatResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchChatsQuery {
    #[serde(default)]
    pub q: String,
}

pub fn create_chat_routes() -> Router<GatewayState> {
    Router::new()
        .route("/chats", get(list_chats).post(resolve_chat))
        .route("/chats/search", get(search_chats))
        .route("/chats/:chat_id", get(view_chat).patch(rename_chat))
        .route("/chats/:chat_id/join", post(join_chat))
}

#[utoipa::path(
    get,
    path = "/api/v1/chats",
    tag = "Chats",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The requester's chats, newest first", body = Vec<ChatSummaryResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn list_chats(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> GatewayResult<Json<Vec<ChatSummaryResponse>>> {
    let user = current_user(&state, &headers).await?;
    let chats = state.chat_service().list_chats(user.id).await?;
    Ok(Json(chats.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats",
    tag = "Chats",
    security(("bearerAuth" = [])),
    request_body = ResolveChatBody,
    responses(
        (status = 201, description = "Chat created", body = ChatResponse),
        (status = 200, description = "Existing direct chat returned", body = ChatResponse),
        (status = 400, description = "Unknown participants, missing or duplicate group name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn resolve_chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<ResolveChatBody>,
) -> GatewayResult<(StatusCode, Json<ChatResponse>)> {
    let user = current_user(&state, &headers).await?;

    let request = ResolveChatRequest {
        participants: body.participants,
        name: body.name,
        is_group: body.is_group,
    };
    let resolved = state.chat_service().resolve_chat(&user, &request).await?;

    let status = if resolved.created {
        info!(user_id = user.id, chat_id = resolved.chat.id, is_group = resolved.chat.is_group, "chat created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(ChatResponse::from(&resolved.chat))))
}

#[utoipa::path(
    get,
    path = "/api/v1/chats/search",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(SearchChatsQuery),
    responses(
        (status = 200, description = "The requester's chats whose name contains the query", body = Vec<ChatSummaryResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn search_chats(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<SearchChatsQuery>,
) -> GatewayResult<Json<Vec<ChatSummaryResponse>>> {
    let user = current_user(&state, &headers).await?;
    let chats = state.chat_service().search_chats(user.id, &query.q).await?;
    Ok(Json(chats.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/chats/{chat_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("chat_id" = i64, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Full chat, or a group preview with access=false", body = ChatViewResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Direct chat of other users", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse)
    )
)]
pub async fn view_chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(chat_id): Path<i64>,
) -> GatewayResult<Json<ChatViewResponse>> {
    let user = current_user(&state, &headers).await?;

    let response = match state.chat_service().view_chat(user.id, chat_id).await? {
        ChatView::FullDetail(detail) => ChatViewResponse {
            access: true,
            id: detail.chat_id,
            title: detail.title,
            is_group: detail.is_group,
            participants: detail.participants,
            messages: detail.messages.into_iter().map(Into::into).collect(),
        },
        ChatView::RedactedGroupPreview(preview) => ChatViewResponse {
            access: false,
            id: preview.chat_id,
            title: preview.name,
            is_group: true,
            participants: preview.participants,
            messages: Vec::new(),
        },
        ChatView::Forbidden => {
            return Err(GatewayError::AuthorizationFailed(
                "you are not a participant of this chat".into(),
            ))
        }
    };

    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/v1/chats/{chat_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("chat_id" = i64, Path, description = "Chat id")),
    request_body = RenameChatBody,
    responses(
        (status = 200, description = "Chat renamed", body = ChatResponse),
        (status = 400, description = "Direct chat, blank or duplicate name", body = ErrorResponse),
        (status = 403, description = "Requester is not a participant", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse)
    )
)]
pub async fn rename_chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(chat_id): Path<i64>,
    Json(body): Json<RenameChatBody>,
) -> GatewayResult<Json<ChatResponse>> {
    let user = current_user(&state, &headers).await?;

    let chat = state
        .chat_service()
        .rename_chat(user.id, chat_id, &RenameChatRequest { name: body.name })
        .await?;

    info!(user_id = user.id, chat_id, "chat renamed");
    Ok(Json(ChatResponse::from(&chat)))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/{chat_id}/join",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("chat_id" = i64, Path, description = "Chat id")),
    responses(
        (status = 200, description = "Joined, or already a participant", body = JoinChatResponse),
        (status = 400, description = "Direct chats cannot be joined", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse)
    )
)]
pub async fn join_chat(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(chat_id): Path<i64>,
) -> GatewayResult<Json<JoinChatResponse>> {
    let user = current_user(&state, &headers).await?;

    let outcome = state.chat_service().join_chat(user.id, chat_id).await?;
    let joined = matches!(outcome, JoinOutcome::Joined(_));

    Ok(Json(JoinChatResponse {
        joined,
        chat: ChatResponse::from(outcome.chat()),
    }))
}
