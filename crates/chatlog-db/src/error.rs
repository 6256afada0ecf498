use thiserror::Error;

/// Outcomes of store operations that are the caller's fault, plus a
/// catch-all for storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field was empty or absent. Carries the client-facing text.
    #[error("{0}")]
    MissingField(&'static str),

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UnknownUser,

    #[error("File type not allowed")]
    DisallowedExtension,

    #[error("File not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Storage(e.into())
    }
}
