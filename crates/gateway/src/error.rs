//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use messenger_auth::AuthError;
use messenger_chats::ChatError;
use messenger_database::DatabaseError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<DatabaseError> for GatewayError {
    fn from(error: DatabaseError) -> Self {
        error!(error = ?error, "database error");
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<ChatError> for GatewayError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::Database(inner) => inner.into(),
            ChatError::ChatNotFound { .. } | ChatError::MessageNotFound { .. } => {
                GatewayError::NotFound(error.to_string())
            }
            ChatError::Forbidden { .. } => GatewayError::AuthorizationFailed(error.to_string()),
            ChatError::UnknownParticipant { .. }
            | ChatError::EmptyParticipantSet
            | ChatError::MissingGroupName
            | ChatError::DuplicateGroupName { .. }
            | ChatError::InvalidOperation { .. }
            | ChatError::Validation { .. } => GatewayError::InvalidRequest(error.to_string()),
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::InvalidSession => GatewayError::AuthenticationFailed(error.to_string()),
            AuthError::UserExists | AuthError::Validation(_) => {
                GatewayError::InvalidRequest(error.to_string())
            }
            AuthError::UserNotFound => GatewayError::NotFound(error.to_string()),
            AuthError::Database(inner) => inner.into(),
            AuthError::PasswordHash(_) => {
                error!(error = ?error, "password hashing failed");
                GatewayError::InternalError(error.to_string())
            }
        }
    }
}
