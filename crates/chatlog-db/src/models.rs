//! Table row types. These map directly onto CSV records and are kept apart
//! from the chatlog-types API models so the file layout can change freely.
use serde::{Deserialize, Serialize};

pub const USER_COLUMNS: &[&str] = &["username", "password_hash"];
pub const MESSAGE_COLUMNS: &[&str] = &["timestamp", "username", "message", "type"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRow {
    pub timestamp: String,
    pub username: String,
    pub message: String,
    /// Older files may lack the column or leave it blank.
    #[serde(rename = "type", default)]
    pub kind: String,
}
