use anyhow::anyhow;
use chatlog_types::models::{Message, MessageType};
use tracing::debug;

use crate::Database;
use crate::error::StoreError;
use crate::models::MessageRow;

const MESSAGE_REQUIRED: &str = "Username and message are required";

/// ISO-8601 timestamp with microsecond precision, UTC.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

impl Database {
    // -- Message log --

    /// Every message in insertion order.
    pub fn list_messages(&self) -> Result<Vec<Message>, StoreError> {
        let rows: Vec<MessageRow> = self.messages.with_lock(|table| table.read())?;

        rows.into_iter()
            .map(|row| -> Result<Message, StoreError> {
                let kind = MessageType::from_column(&row.kind).ok_or_else(|| {
                    anyhow!("Unknown message type '{}' from {}", row.kind, row.username)
                })?;
                Ok(Message {
                    timestamp: row.timestamp,
                    username: row.username,
                    message: row.message,
                    kind,
                })
            })
            .collect()
    }

    /// Post a message on behalf of a registered user.
    ///
    /// Runs the retention check before writing, so the new row survives a
    /// reclaim triggered by this very call.
    pub fn append_message(
        &self,
        username: &str,
        message: &str,
        kind: MessageType,
    ) -> Result<Message, StoreError> {
        if username.is_empty() || message.is_empty() {
            return Err(StoreError::MissingField(MESSAGE_REQUIRED));
        }
        if !self.user_exists(username)? {
            return Err(StoreError::UnknownUser);
        }

        self.check_and_reclaim()?;
        self.push_message(username, message, kind)
    }

    /// Record an uploaded image. The username is not checked against the
    /// credential table.
    pub fn append_image_reference(
        &self,
        username: &str,
        filename: &str,
    ) -> Result<Message, StoreError> {
        self.push_message(username, filename, MessageType::Image)
    }

    fn push_message(
        &self,
        username: &str,
        message: &str,
        kind: MessageType,
    ) -> Result<Message, StoreError> {
        let row = MessageRow {
            timestamp: now_timestamp(),
            username: username.to_string(),
            message: message.to_string(),
            kind: kind.as_str().to_string(),
        };

        self.messages.with_lock(|table| {
            let mut rows: Vec<MessageRow> = table.read()?;
            rows.push(row.clone());
            table.rewrite(&rows)
        })?;

        debug!("Appended {} message from {}", kind.as_str(), username);
        Ok(Message {
            timestamp: row.timestamp,
            username: row.username,
            message: row.message,
            kind,
        })
    }
}
