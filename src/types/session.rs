//! Session and panel layout types

use crate::types::errors::AppError;
use crate::types::message::{Message, Role};
use crate::types::tool::ToolId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A named set of per-tool conversation threads
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub histories: BTreeMap<ToolId, Vec<Message>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            title: title.into(),
            histories: ToolId::ALL.into_iter().map(|id| (id, Vec::new())).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn history(&self, tool: ToolId) -> &[Message] {
        self.histories.get(&tool).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when no tool has any message yet
    pub fn is_empty(&self) -> bool {
        self.histories.values().all(Vec::is_empty)
    }

    /// Append a user message and its streaming assistant placeholder.
    ///
    /// Fails when the thread already ends with a user message.
    pub fn push_exchange(
        &mut self,
        tool: ToolId,
        user: Message,
        placeholder: Message,
    ) -> Result<(), AppError> {
        if user.role != Role::User || placeholder.role != Role::Assistant {
            return Err(AppError::Conflict("exchange must be user then assistant".into()));
        }
        let history = self.histories.entry(tool).or_default();
        if history.last().is_some_and(Message::is_user) {
            return Err(AppError::Conflict(format!(
                "{} history already ends with an unanswered user message",
                tool
            )));
        }
        history.push(user);
        history.push(placeholder);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn message(&self, tool: ToolId, message_id: &str) -> Option<&Message> {
        self.history(tool).iter().find(|m| m.id == message_id)
    }

    /// Apply `f` to one message by id. Returns false when it no longer exists.
    pub fn update_message<F>(&mut self, tool: ToolId, message_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Message),
    {
        let found = self
            .histories
            .get_mut(&tool)
            .and_then(|h| h.iter_mut().find(|m| m.id == message_id));
        match found {
            Some(message) => {
                f(message);
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn clear_history(&mut self, tool: ToolId) {
        self.histories.insert(tool, Vec::new());
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            message_count: self.histories.values().map(Vec::len).sum(),
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Single,
    Split,
    #[default]
    Grid,
}

impl LayoutMode {
    pub fn slot_count(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Split => 2,
            Self::Grid => 4,
        }
    }
}

pub const SLOT_COUNT: usize = 4;

/// Which tool each screen slot shows. All four assignments survive layout changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelLayout {
    pub mode: LayoutMode,
    pub slots: [ToolId; SLOT_COUNT],
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Grid,
            slots: [ToolId::Chat, ToolId::Data, ToolId::Flow, ToolId::Image],
        }
    }
}

impl PanelLayout {
    /// Tools of the currently visible slots, in slot order
    pub fn active_slots(&self) -> &[ToolId] {
        &self.slots[..self.mode.slot_count()]
    }

    pub fn assign(&mut self, slot: usize, tool: ToolId) -> Result<(), AppError> {
        let target = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| AppError::BadInput(format!("no panel slot {}", slot)))?;
        *target = tool;
        Ok(())
    }
}
