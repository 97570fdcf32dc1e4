//! Message REST endpoints

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use messenger_chats::{MessageView, PostMessageRequest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::current_user;
use crate::rest::profile::UserResponse;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: i64,
    pub chat_id: i64,
    pub author: UserResponse,
    pub content: String,
    pub created_at: String,
    /// Whether the requester likes this message.
    pub liked: bool,
    pub liked_by: Vec<String>,
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        Self {
            id: view.id,
            chat_id: view.chat_id,
            author: view.author.into(),
            content: view.content,
            created_at: view.created_at,
            liked: view.liked,
            liked_by: view.liked_by,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub chat_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
}

pub fn create_message_routes() -> Router<GatewayState> {
    Router::new()
        .route("/messages", post(create_message))
        .route("/messages/:message_id/like", post(toggle_like))
}

#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    security(("bearerAuth" = [])),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = MessageResponse),
        (status = 400, description = "Empty content", body = ErrorResponse),
        (status = 403, description = "Requester is not a participant", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse)
    )
)]
pub async fn create_message(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<CreateMessageRequest>,
) -> GatewayResult<(StatusCode, Json<MessageResponse>)> {
    let user = current_user(&state, &headers).await?;

    let request = PostMessageRequest {
        chat_id: body.chat_id,
        content: body.content,
    };
    let message = state.message_service().post_message(user.id, &request).await?;

    Ok((StatusCode::CREATED, Json(message.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/messages/{message_id}/like",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(("message_id" = i64, Path, description = "Message id")),
    responses(
        (status = 200, description = "Like toggled; `liked` is the new state", body = LikeResponse),
        (status = 403, description = "Requester is not a participant", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    )
)]
pub async fn toggle_like(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(message_id): Path<i64>,
) -> GatewayResult<Json<LikeResponse>> {
    let user = current_user(&state, &headers).await?;
    let liked = state.message_service().toggle_like(user.id, message_id).await?;
    Ok(Json(LikeResponse { liked }))
}
