use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use chatlog_db::Database;
use chatlog_types::api::{CredentialsRequest, LoginResponse, StatusResponse};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    // Run blocking table I/O off the async runtime
    tokio::task::spawn_blocking(move || state.db.register(&username, &password)).await??;

    Ok(Json(StatusResponse::success("User registered successfully")))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let username =
        tokio::task::spawn_blocking(move || state.db.login(&username, &password)).await??;

    Ok(Json(LoginResponse {
        status: "success",
        username,
    }))
}
