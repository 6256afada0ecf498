use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderValue, header},
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;

use chatlog_db::uploads::content_type;
use chatlog_types::api::UploadResponse;

use crate::auth::AppState;
use crate::error::ApiError;

const NO_FILE_PART: &str = "No file part";

/// POST /upload: multipart form with a `file` part and a `username` field.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::MissingField(NO_FILE_PART))?;

    let mut username = String::new();
    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((filename, bytes));
            }
            "username" => username = field.text().await?,
            _ => {}
        }
    }
    let (filename, bytes) = file.ok_or(ApiError::MissingField(NO_FILE_PART))?;

    let stored = tokio::task::spawn_blocking(move || {
        state.db.accept_upload(&username, &filename, &bytes)
    })
    .await??;

    Ok(Json(UploadResponse {
        status: "success",
        filename: stored,
    }))
}

/// GET /images/{filename}: streams the stored file back.
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (file, len) = state.db.uploads.open(&filename).await?;

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type(&filename))),
        (header::CONTENT_LENGTH, HeaderValue::from(len)),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))))
}
