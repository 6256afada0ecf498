use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use chatlog_db::StoreError;
use chatlog_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Body absent, not JSON, or the wrong shape.
    #[error("{0}")]
    MalformedPayload(String),

    #[error("{0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::MalformedPayload("No JSON data received".into())
            }
            other => ApiError::MalformedPayload(other.body_text()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedPayload(_) | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Store(e) => match e {
                StoreError::MissingField(_)
                | StoreError::DuplicateUsername
                | StoreError::DisallowedExtension => StatusCode::BAD_REQUEST,
                StoreError::InvalidCredentials | StoreError::UnknownUser => {
                    StatusCode::UNAUTHORIZED
                }
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Storage failures carry their whole context chain back to the caller.
        let message = match &self {
            ApiError::Store(StoreError::Storage(e)) => format!("{:#}", e),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
