//! Registration, login and logout endpoints

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use messenger_auth::Registration;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::require_bearer;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub phone_number: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: String,
}

pub fn create_auth_routes() -> Router<GatewayState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[utoipa::path(
    post,
    path = "/api/v1/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = RegisterResponse),
        (status = 400, description = "Invalid input or phone number taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<GatewayState>,
    Json(payload): Json<RegisterRequest>,
) -> GatewayResult<(StatusCode, Json<RegisterResponse>)> {
    let registration = Registration {
        phone_number: payload.phone_number,
        first_name: payload.first_name,
        last_name: payload.last_name,
        password: payload.password,
    };

    let (user, session) = state.authenticator().register(&registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            token: session.token,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<GatewayState>,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<Json<TokenResponse>> {
    let session = state
        .authenticator()
        .login(&payload.phone_number, &payload.password)
        .await?;

    Ok(Json(TokenResponse {
        token: session.token,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/logout",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn logout(State(state): State<GatewayState>, headers: HeaderMap) -> GatewayResult<StatusCode> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.authenticator().logout(&token).await?;
    debug!(user_id = user.id, "session revoked");
    Ok(StatusCode::NO_CONTENT)
}
