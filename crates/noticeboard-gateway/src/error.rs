use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use noticeboard_persistence::StoreError;
use noticeboard_types::FieldError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    /// Rejected before reaching the store; the body is the field error list
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    #[error("Message not found")]
    NotFound,

    #[error("Request accepted but not completed: {0}")]
    MutationFailed(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MutationFailed(msg) => {
                tracing::warn!("Mutation failed: {}", msg);
                StatusCode::ACCEPTED
            }
            ApiError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                StatusCode::BAD_GATEWAY
            }
        };

        let body = Json(json!({
            "code": status.as_u16(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::MutationFailed(msg) => ApiError::MutationFailed(msg),
            StoreError::Unavailable(e) => ApiError::Unavailable(e.to_string()),
            StoreError::Corrupt(msg) => ApiError::Unavailable(format!("corrupt row: {}", msg)),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
