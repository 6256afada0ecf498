pub mod auth;
pub mod error;
pub mod files;
pub mod messages;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::auth::AppState;

/// All six endpoints, relative to the API base path.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/upload", post(files::upload_image))
        .route("/images/{filename}", get(files::get_image))
        .route(
            "/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
