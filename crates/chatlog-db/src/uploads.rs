use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

use crate::Database;
use crate::error::StoreError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Directory of uploaded image blobs, stored flat as `{dir}/{stored_name}`.
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.file_path(name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Open a stored file for streaming. Returns the handle and its length.
    ///
    /// Names that would not survive sanitization never reach the filesystem,
    /// which keeps lookups inside the upload directory.
    pub async fn open(&self, name: &str) -> Result<(fs::File, u64), StoreError> {
        if name.is_empty() || secure_filename(name) != name {
            return Err(StoreError::NotFound);
        }

        let path = self.file_path(name);
        let metadata = match fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(StoreError::NotFound),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let file = fs::File::open(&path).await?;
        Ok((file, metadata.len()))
    }

    /// Names of every file currently stored.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete every regular file. Failures are logged and skipped.
    /// Returns how many files were removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.dir.display(), e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Error deleting {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}

/// True when the text after the last `.` is an allowed image extension.
pub fn is_allowed(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied name to `[A-Za-z0-9_.-]`.
///
/// Compatibility-decomposes the name and keeps its ASCII part, so accented
/// letters lose only the accent. `/` becomes a space, whitespace runs become a
/// single `_`, other characters are dropped and leading/trailing dots and
/// underscores trimmed.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// `{unix_secs}.{micros}_{original}`, sanitized.
pub fn stored_name(original: &str, now: chrono::DateTime<chrono::Utc>) -> String {
    secure_filename(&format!(
        "{}.{:06}_{}",
        now.timestamp(),
        now.timestamp_subsec_micros(),
        original
    ))
}

pub fn content_type(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

impl Database {
    // -- Upload store --

    /// Store an uploaded image and log it as an image message.
    /// Returns the stored file name.
    pub fn accept_upload(
        &self,
        username: &str,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        if username.is_empty() {
            return Err(StoreError::MissingField("Username is required"));
        }
        if original_filename.is_empty() {
            return Err(StoreError::MissingField("No selected file"));
        }
        if !is_allowed(original_filename) {
            return Err(StoreError::DisallowedExtension);
        }

        self.check_and_reclaim()?;

        let name = stored_name(original_filename, chrono::Utc::now());
        self.uploads.save(&name, bytes)?;
        // No cleanup if this fails: the blob stays on disk unreferenced.
        self.append_image_reference(username, &name)?;

        info!("Stored upload {} ({} bytes) from {}", name, bytes.len(), username);
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MAX_DATA_BYTES;
    use chatlog_types::models::MessageType;
    use chrono::TimeZone;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(is_allowed("cat.PNG"));
        assert!(is_allowed("archive.tar.jpeg"));
        assert!(is_allowed(".gif"));
        assert!(!is_allowed("notes.txt"));
        assert!(!is_allowed("png"));
        assert!(!is_allowed("image.png.exe"));
    }

    #[test]
    fn secure_filename_strips_paths_and_odd_characters() {
        assert_eq!(secure_filename("My cool movie.mov"), "My_cool_movie.mov");
        assert_eq!(secure_filename("../../../etc/passwd"), "etc_passwd");
        assert_eq!(secure_filename("i contain cool \u{fc}ml\u{e4}uts.txt"), "i_contain_cool_umlauts.txt");
        assert_eq!(secure_filename("caf\u{e9}.png"), "cafe.png");
        assert_eq!(secure_filename("a\\b.png"), "ab.png");
        assert_eq!(secure_filename("..."), "");
    }

    #[test]
    fn stored_name_is_time_prefixed() {
        let now = chrono::Utc.timestamp_opt(1_700_000_000, 42_000).unwrap();
        assert_eq!(stored_name("cat pic.png", now), "1700000000.000042_cat_pic.png");
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type("a.JPG"), "image/jpeg");
        assert_eq!(content_type("a.gif"), "image/gif");
        assert_eq!(content_type("a"), "application/octet-stream");
    }

    #[test]
    fn accept_upload_writes_blob_and_logs_image_message() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), DEFAULT_MAX_DATA_BYTES).unwrap();

        let name = db.accept_upload("alice", "cat.png", b"\x89PNG").unwrap();

        assert!(name.ends_with("_cat.png"));
        assert_eq!(std::fs::read(db.uploads.file_path(&name)).unwrap(), b"\x89PNG");
        let messages = db.list_messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, name);
        assert_eq!(messages[0].kind, MessageType::Image);
    }

    #[test]
    fn rejected_upload_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), DEFAULT_MAX_DATA_BYTES).unwrap();

        let err = db.accept_upload("alice", "notes.txt", b"hello").unwrap_err();

        assert!(matches!(err, StoreError::DisallowedExtension));
        assert!(db.uploads.list_files().unwrap().is_empty());
        assert!(db.list_messages().unwrap().is_empty());
    }

    #[test]
    fn upload_over_ceiling_reclaims_before_storing() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), 1024).unwrap();
        let first = db.accept_upload("alice", "first.png", &[1u8; 2048]).unwrap();
        assert_eq!(db.uploads.list_files().unwrap(), vec![first]);

        let second = db.accept_upload("alice", "second.jpg", b"jpg").unwrap();

        assert_eq!(db.uploads.list_files().unwrap(), vec![second.clone()]);
        let messages = db.list_messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message, second);
        assert_eq!(messages[0].kind, MessageType::Image);
    }

    #[tokio::test]
    async fn open_rejects_traversal_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), DEFAULT_MAX_DATA_BYTES).unwrap();

        assert!(matches!(db.uploads.open("../users.csv").await, Err(StoreError::NotFound)));
        assert!(matches!(db.uploads.open("missing.png").await, Err(StoreError::NotFound)));

        db.uploads.save("here.png", b"abc").unwrap();
        let (_file, len) = db.uploads.open("here.png").await.unwrap();
        assert_eq!(len, 3);
    }
}
