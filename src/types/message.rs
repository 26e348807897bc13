use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// A file sent along with a message.
///
/// Text-like files carry their contents verbatim in `data`; everything else
/// carries base64 without the data-URL prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub is_text: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub streaming: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new_user(content: String, attachments: Vec<Attachment>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role: Role::User,
            content,
            attachments,
            suggestions: Vec::new(),
            streaming: false,
            timestamp: Utc::now(),
        }
    }

    /// Empty assistant message shown while a response streams in
    pub fn placeholder() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            role: Role::Assistant,
            content: String::new(),
            attachments: Vec::new(),
            suggestions: Vec::new(),
            streaming: true,
            timestamp: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Body of `POST /api/chat/gemini`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub system_instruction: Option<String>,
}

impl RelayRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Body of a workstation send
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub session_id: String,
    pub message_id: String,
}
