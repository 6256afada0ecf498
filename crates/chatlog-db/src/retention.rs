use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};

use crate::Database;
use crate::error::StoreError;

/// 400 MiB.
pub const DEFAULT_MAX_DATA_BYTES: u64 = 400 * 1024 * 1024;

/// Result of one retention check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reclaim {
    /// Footprint measured before any deletion.
    pub measured_bytes: u64,
    pub reclaimed: bool,
    pub files_removed: usize,
}

/// Total size of every file below `dir`, recursively.
///
/// Entries that disappear while walking are skipped.
pub fn data_size(dir: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = match std::fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            total += data_size(&entry.path())?;
        } else {
            total += metadata.len();
        }
    }
    Ok(total)
}

impl Database {
    /// Wipe the message table and the upload directory when the data
    /// directory has grown past the ceiling. Users are never touched.
    ///
    /// Holds the message table lock for the whole wipe so readers see either
    /// the old log or the empty one.
    pub fn check_and_reclaim(&self) -> Result<Reclaim, StoreError> {
        let measured_bytes = data_size(self.root())?;
        if measured_bytes <= self.max_data_bytes() {
            return Ok(Reclaim {
                measured_bytes,
                reclaimed: false,
                files_removed: 0,
            });
        }

        warn!(
            "Data size ({} bytes) exceeds limit ({} bytes). Clearing messages and uploads",
            measured_bytes,
            self.max_data_bytes()
        );

        let files_removed = self.messages.with_lock(|table| {
            if let Err(e) = table.truncate() {
                error!("Failed to clear {}: {}", table.path().display(), e);
            }
            match self.uploads.clear() {
                Ok(n) => Ok::<_, anyhow::Error>(n),
                Err(e) => {
                    error!("Failed to clear {}: {}", self.uploads.dir().display(), e);
                    Ok(0)
                }
            }
        })?;

        info!("Data cleared: {} uploaded files removed", files_removed);
        Ok(Reclaim {
            measured_bytes,
            reclaimed: true,
            files_removed,
        })
    }
}
