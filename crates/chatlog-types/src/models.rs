use serde::{Deserialize, Serialize};

/// Kind of payload a message row carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    /// `message` holds the stored name of an uploaded file.
    Image,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
        }
    }

    /// Parse the `type` column of the message table. Empty cells read as text.
    pub fn from_column(value: &str) -> Option<Self> {
        match value.trim() {
            "" | "text" => Some(MessageType::Text),
            "image" => Some(MessageType::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: String,
    pub username: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
}
