use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use chatlog_types::api::{SendMessageRequest, StatusResponse};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn get_messages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let messages = tokio::task::spawn_blocking(move || state.db.list_messages()).await??;
    Ok(Json(messages))
}

/// Message text is stored as-is; `type` defaults to text.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let username = req.username.unwrap_or_default();
    let message = req.message.unwrap_or_default();
    let kind = req.kind.unwrap_or_default();

    tokio::task::spawn_blocking(move || state.db.append_message(&username, &message, kind))
        .await??;

    Ok(Json(StatusResponse::success("Message sent successfully")))
}
