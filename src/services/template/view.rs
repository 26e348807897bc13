//! Serializable snapshots handed to templates

use crate::services::session::SessionManager;
use crate::types::{AppError, Message, PanelLayout, SessionSummary, Tool, TOOLS};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PanelView {
    pub slot: usize,
    pub session_id: String,
    pub tool: &'static Tool,
    pub messages: Vec<Message>,
    pub generating: bool,
}

impl PanelView {
    pub fn capture(manager: &SessionManager, slot: usize) -> Result<Self, AppError> {
        let tool = *manager
            .layout()
            .slots
            .get(slot)
            .ok_or_else(|| AppError::BadInput(format!("no panel slot {}", slot)))?;
        let session = manager.current();
        Ok(Self {
            slot,
            session_id: session.id.clone(),
            tool: tool.descriptor(),
            messages: session.history(tool).to_vec(),
            generating: manager.is_generating(&session.id, tool),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct WorkstationView {
    pub version: &'static str,
    pub session: SessionSummary,
    pub sessions: Vec<SessionSummary>,
    pub layout: PanelLayout,
    pub panels: Vec<PanelView>,
    pub tools: &'static [Tool],
}

impl WorkstationView {
    pub fn capture(manager: &SessionManager) -> Result<Self, AppError> {
        let layout = manager.layout().clone();
        let panels = (0..layout.mode.slot_count())
            .map(|slot| PanelView::capture(manager, slot))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version: env!("CARGO_PKG_VERSION"),
            session: manager.current().summary(),
            sessions: manager.list(),
            layout,
            panels,
            tools: &TOOLS,
        })
    }
}
