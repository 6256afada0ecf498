use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use chatlog_db::DEFAULT_MAX_DATA_BYTES;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub max_data_bytes: u64,
    pub max_upload_bytes: usize,
    pub base_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("CHATLOG_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port: u16 = std::env::var("CHATLOG_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .context("CHATLOG_PORT must be a port number")?;
        let data_dir: PathBuf = std::env::var("CHATLOG_DATA_DIR")
            .unwrap_or_else(|_| "data".into())
            .into();
        let max_data_bytes: u64 = std::env::var("CHATLOG_MAX_DATA_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_DATA_BYTES);
        let max_upload_bytes: usize = std::env::var("CHATLOG_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16 * 1024 * 1024);
        let base_path = std::env::var("CHATLOG_BASE_PATH").unwrap_or_else(|_| "/api".into());

        Ok(Self {
            host,
            port,
            data_dir,
            max_data_bytes,
            max_upload_bytes,
            base_path: normalize_base_path(&base_path),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// `api/` and `/api` both become `/api`; an empty value or `/` means the root.
fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_is_normalized() {
        assert_eq!(normalize_base_path("/api"), "/api");
        assert_eq!(normalize_base_path("api/"), "/api");
        assert_eq!(normalize_base_path("/"), "");
        assert_eq!(normalize_base_path(""), "");
        assert_eq!(normalize_base_path("/v1/chat/"), "/v1/chat");
    }
}
