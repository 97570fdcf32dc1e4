//! Profile and user directory endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use messenger_auth::ProfileUpdate;
use messenger_chats::User;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::current_user;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            first_name: user.first_name,
            last_name: user.last_name,
            date_of_birth: user.date_of_birth,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `YYYY-MM-DD`, or an empty string to clear it
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchUsersQuery {
    #[serde(default)]
    pub search: String,
}

pub fn create_profile_routes() -> Router<GatewayState> {
    Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/users/search", get(search_users))
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "Profile",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "The signed-in user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> GatewayResult<Json<UserResponse>> {
    let user = current_user(&state, &headers).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/profile",
    tag = "Profile",
    security(("bearerAuth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid field or phone number taken", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let user = current_user(&state, &headers).await?;

    let update = ProfileUpdate {
        phone_number: payload.phone_number,
        first_name: payload.first_name,
        last_name: payload.last_name,
        date_of_birth: payload.date_of_birth,
    };
    let updated = state.authenticator().update_profile(user.id, &update).await?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    tag = "Profile",
    security(("bearerAuth" = [])),
    params(SearchUsersQuery),
    responses(
        (status = 200, description = "Matching users, excluding the requester", body = Vec<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    )
)]
pub async fn search_users(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<SearchUsersQuery>,
) -> GatewayResult<Json<Vec<UserResponse>>> {
    let user = current_user(&state, &headers).await?;
    let users = state.authenticator().search_users(user.id, &query.search).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}
