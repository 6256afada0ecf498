pub mod error;
pub mod messages;
pub mod models;
pub mod retention;
pub mod table;
pub mod uploads;
pub mod users;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub use error::StoreError;
pub use retention::{DEFAULT_MAX_DATA_BYTES, Reclaim};
pub use uploads::Uploads;

use crate::table::Table;

pub const USERS_FILE: &str = "users.csv";
pub const MESSAGES_FILE: &str = "messages.csv";
pub const UPLOADS_DIR: &str = "uploads";

/// Flat-file state rooted at one data directory: the credential table, the
/// message table and the upload directory.
///
/// Each table is read in full and rewritten on every mutation. Access to a
/// table goes through its own lock, so concurrent requests within this
/// process cannot lose each other's rows.
pub struct Database {
    root: PathBuf,
    max_data_bytes: u64,
    pub(crate) users: Table,
    pub(crate) messages: Table,
    pub uploads: Uploads,
}

impl Database {
    /// Create the data directory layout if missing and open both tables.
    pub fn open(root: &Path, max_data_bytes: u64) -> Result<Self> {
        std::fs::create_dir_all(root)?;

        let users = Table::open(root.join(USERS_FILE), models::USER_COLUMNS)?;
        let messages = Table::open(root.join(MESSAGES_FILE), models::MESSAGE_COLUMNS)?;
        let uploads = Uploads::new(root.join(UPLOADS_DIR))?;

        info!(
            "Data directory opened at {} (retention ceiling {} bytes)",
            root.display(),
            max_data_bytes
        );
        Ok(Self {
            root: root.to_path_buf(),
            max_data_bytes,
            users,
            messages,
            uploads,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_data_bytes(&self) -> u64 {
        self.max_data_bytes
    }
}
