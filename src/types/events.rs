use crate::types::tool::ToolId;
use serde::{Deserialize, Serialize};

/// Workstation updates pushed to the browser over SSE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A new exchange was appended to a tool thread
    MessageStarted {
        session_id: String,
        tool_id: ToolId,
        message_id: String,
    },
    /// Visible content of a streaming message changed
    MessageContent {
        session_id: String,
        tool_id: ToolId,
        message_id: String,
        html: String,
    },
    MessageComplete {
        session_id: String,
        tool_id: ToolId,
        message_id: String,
        html: String,
        suggestions: Vec<String>,
    },
    MessageError {
        session_id: String,
        tool_id: ToolId,
        message_id: String,
        error: String,
    },
    HistoryCleared {
        session_id: String,
        tool_id: ToolId,
    },
    TitleUpdated {
        session_id: String,
        title: String,
    },
    SessionsChanged,
    LayoutChanged,
}

impl StreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageStarted { .. } => "message_started",
            Self::MessageContent { .. } => "message_content",
            Self::MessageComplete { .. } => "message_complete",
            Self::MessageError { .. } => "message_error",
            Self::HistoryCleared { .. } => "history_cleared",
            Self::TitleUpdated { .. } => "title_updated",
            Self::SessionsChanged => "sessions_changed",
            Self::LayoutChanged => "layout_changed",
        }
    }

    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
