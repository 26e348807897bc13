use crate::types::{
    AppError, LayoutMode, PanelLayout, Session, SessionSummary, StreamEvent, ToolId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

pub const INITIAL_TITLE: &str = "New topic";
pub const NEW_SESSION_TITLE: &str = "New chat";

const EVENT_CAPACITY: usize = 256;

struct Generation {
    message_id: String,
    token: CancellationToken,
}

/// Server-resident workstation state.
///
/// Sessions are immutable snapshots behind `Arc`; every mutation clones the
/// session, applies the change and swaps the pointer.
pub struct SessionManager {
    sessions: Vec<Arc<Session>>,
    current: String,
    layout: PanelLayout,
    in_flight: HashMap<(String, ToolId), Generation>,
    event_sender: broadcast::Sender<StreamEvent>,
}

impl SessionManager {
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(EVENT_CAPACITY);
        let first = Session::new(INITIAL_TITLE);
        Self {
            current: first.id.clone(),
            sessions: vec![Arc::new(first)],
            layout: PanelLayout::default(),
            in_flight: HashMap::new(),
            event_sender,
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        self.sessions.iter().map(|s| s.summary()).collect()
    }

    pub fn get(&self, id: &str) -> Result<Arc<Session>, AppError> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    pub fn current(&self) -> Arc<Session> {
        self.get(&self.current)
            .unwrap_or_else(|_| self.sessions[0].clone())
    }

    pub fn current_id(&self) -> &str {
        &self.current
    }

    /// New sessions go to the front and become current
    pub fn create(&mut self) -> Arc<Session> {
        let session = Arc::new(Session::new(NEW_SESSION_TITLE));
        tracing::info!("Created session {}", session.id);
        self.current = session.id.clone();
        self.sessions.insert(0, session.clone());
        self.publish(StreamEvent::SessionsChanged);
        session
    }

    pub fn select(&mut self, id: &str) -> Result<Arc<Session>, AppError> {
        let session = self.get(id)?;
        self.current = session.id.clone();
        self.publish(StreamEvent::SessionsChanged);
        Ok(session)
    }

    /// Returns `false` when the session was kept because it is the last one
    pub fn delete(&mut self, id: &str) -> Result<bool, AppError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        if self.sessions.len() == 1 {
            tracing::debug!("Refusing to delete the only session {}", id);
            return Ok(false);
        }

        for tool in ToolId::ALL {
            self.cancel_generation(id, tool);
        }
        self.sessions.remove(index);
        if self.current == id {
            self.current = self.sessions[0].id.clone();
        }
        tracing::info!("Deleted session {}", id);
        self.publish(StreamEvent::SessionsChanged);
        Ok(true)
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<Arc<Session>, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::BadInput("title must not be blank".into()));
        }
        let session = self.update_session(id, |s| {
            s.title = title.to_string();
            Ok(())
        })?;
        self.publish(StreamEvent::TitleUpdated {
            session_id: id.to_string(),
            title: title.to_string(),
        });
        Ok(session)
    }

    /// Clone-apply-swap. The closure's error leaves the stored session untouched.
    pub fn update_session<F>(&mut self, id: &str, f: F) -> Result<Arc<Session>, AppError>
    where
        F: FnOnce(&mut Session) -> Result<(), AppError>,
    {
        let slot = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))?;
        let mut next = Session::clone(slot);
        f(&mut next)?;
        *slot = Arc::new(next);
        Ok(slot.clone())
    }

    pub fn clear_history(&mut self, id: &str, tool: ToolId) -> Result<(), AppError> {
        self.cancel_generation(id, tool);
        self.update_session(id, |s| {
            s.clear_history(tool);
            Ok(())
        })?;
        self.publish(StreamEvent::HistoryCleared {
            session_id: id.to_string(),
            tool_id: tool,
        });
        Ok(())
    }

    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, mode: LayoutMode) -> &PanelLayout {
        self.layout.mode = mode;
        self.publish(StreamEvent::LayoutChanged);
        &self.layout
    }

    pub fn switch_panel_tool(&mut self, slot: usize, tool: ToolId) -> Result<&PanelLayout, AppError> {
        self.layout.assign(slot, tool)?;
        self.publish(StreamEvent::LayoutChanged);
        Ok(&self.layout)
    }

    /// Register a generation for the panel, cancelling any previous one
    pub fn begin_generation(
        &mut self,
        session_id: &str,
        tool: ToolId,
        message_id: &str,
    ) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self.in_flight.insert(
            (session_id.to_string(), tool),
            Generation {
                message_id: message_id.to_string(),
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            tracing::debug!("Superseding generation {}", previous.message_id);
            previous.token.cancel();
        }
        token
    }

    pub fn cancel_generation(&mut self, session_id: &str, tool: ToolId) -> bool {
        match self.in_flight.remove(&(session_id.to_string(), tool)) {
            Some(generation) => {
                tracing::info!("Cancelling generation {}", generation.message_id);
                generation.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Only clears the entry when it still belongs to `message_id`
    pub fn finish_generation(&mut self, session_id: &str, tool: ToolId, message_id: &str) {
        let key = (session_id.to_string(), tool);
        if self
            .in_flight
            .get(&key)
            .is_some_and(|g| g.message_id == message_id)
        {
            self.in_flight.remove(&key);
        }
    }

    pub fn is_generating(&self, session_id: &str, tool: ToolId) -> bool {
        self.in_flight.contains_key(&(session_id.to_string(), tool))
    }

    pub fn sender(&self) -> broadcast::Sender<StreamEvent> {
        self.event_sender.clone()
    }

    pub fn subscribe(&self) -> BroadcastStream<StreamEvent> {
        BroadcastStream::new(self.event_sender.subscribe())
    }

    pub fn publish(&self, event: StreamEvent) {
        // No subscribers is fine
        let _ = self.event_sender.send(event);
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn push(manager: &mut SessionManager, id: &str, tool: ToolId) {
        manager
            .update_session(id, |s| {
                s.push_exchange(tool, Message::new_user("q".into(), vec![]), Message::placeholder())
            })
            .unwrap();
    }

    #[test]
    fn test_initial_state() {
        let manager = SessionManager::new();
        assert_eq!(manager.count(), 1);
        assert_eq!(manager.current().title, INITIAL_TITLE);
        assert_eq!(manager.layout(), &PanelLayout::default());
    }

    #[test]
    fn test_create_prepends_and_selects() {
        let mut manager = SessionManager::new();
        let first = manager.current().id.clone();
        let created = manager.create();
        assert_eq!(created.title, NEW_SESSION_TITLE);
        assert_eq!(manager.list()[0].id, created.id);
        assert_eq!(manager.current_id(), created.id);

        manager.select(&first).unwrap();
        assert_eq!(manager.current().id, first);
        assert!(manager.select("missing").is_err());
    }

    #[test]
    fn test_deleting_the_only_session_is_a_noop() {
        let mut manager = SessionManager::new();
        let id = manager.current().id.clone();
        assert!(!manager.delete(&id).unwrap());
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_delete_current_selects_first_remaining() {
        let mut manager = SessionManager::new();
        let older = manager.current().id.clone();
        let newer = manager.create().id.clone();
        let token = manager.begin_generation(&newer, ToolId::Chat, "m1");

        assert!(manager.delete(&newer).unwrap());
        assert!(token.is_cancelled());
        assert_eq!(manager.current_id(), older);
        assert!(matches!(manager.delete(&newer), Err(AppError::SessionNotFound(_))));
    }

    #[test]
    fn test_update_replaces_the_snapshot() {
        let mut manager = SessionManager::new();
        let id = manager.current().id.clone();
        let before = manager.current();
        push(&mut manager, &id, ToolId::Chat);
        assert!(before.history(ToolId::Chat).is_empty());
        assert_eq!(manager.current().history(ToolId::Chat).len(), 2);
        assert!(!Arc::ptr_eq(&before, &manager.current()));
    }

    #[test]
    fn test_failed_update_keeps_previous_snapshot() {
        let mut manager = SessionManager::new();
        let id = manager.current().id.clone();
        let before = manager.current();
        let result = manager.update_session(&id, |s| {
            s.title = "changed".into();
            Err(AppError::Conflict("nope".into()))
        });
        assert!(result.is_err());
        assert!(Arc::ptr_eq(&before, &manager.current()));
    }

    #[test]
    fn test_rename_rejects_blank_titles() {
        let mut manager = SessionManager::new();
        let id = manager.current().id.clone();
        assert!(matches!(manager.rename(&id, "   "), Err(AppError::BadInput(_))));
        let renamed = manager.rename(&id, "  Rust lifetimes ").unwrap();
        assert_eq!(renamed.title, "Rust lifetimes");
    }

    #[test]
    fn test_clear_history_cancels_and_isolates() {
        let mut manager = SessionManager::new();
        let id = manager.current().id.clone();
        push(&mut manager, &id, ToolId::Chat);
        push(&mut manager, &id, ToolId::Data);
        let token = manager.begin_generation(&id, ToolId::Chat, "m");

        manager.clear_history(&id, ToolId::Chat).unwrap();
        assert!(token.is_cancelled());
        assert!(!manager.is_generating(&id, ToolId::Chat));
        assert!(manager.current().history(ToolId::Chat).is_empty());
        assert_eq!(manager.current().history(ToolId::Data).len(), 2);
    }

    #[test]
    fn test_switching_panel_tool_keeps_histories() {
        let mut manager = SessionManager::new();
        let id = manager.current().id.clone();
        push(&mut manager, &id, ToolId::Chat);
        manager.switch_panel_tool(0, ToolId::Research).unwrap();
        assert_eq!(manager.layout().slots[0], ToolId::Research);
        assert_eq!(manager.current().history(ToolId::Chat).len(), 2);
        assert!(manager.switch_panel_tool(9, ToolId::Chat).is_err());
    }

    #[test]
    fn test_layout_mode_keeps_slot_assignments() {
        let mut manager = SessionManager::new();
        manager.switch_panel_tool(3, ToolId::Notebook).unwrap();
        manager.set_layout(LayoutMode::Single);
        assert_eq!(manager.layout().active_slots(), &[ToolId::Chat]);
        manager.set_layout(LayoutMode::Grid);
        assert_eq!(manager.layout().active_slots()[3], ToolId::Notebook);
    }

    #[test]
    fn test_generation_tokens_per_panel() {
        let mut manager = SessionManager::new();
        let id = manager.current().id.clone();
        let first = manager.begin_generation(&id, ToolId::Chat, "m1");
        let other_panel = manager.begin_generation(&id, ToolId::Flow, "m2");
        let second = manager.begin_generation(&id, ToolId::Chat, "m3");
        assert!(first.is_cancelled());
        assert!(!other_panel.is_cancelled());
        assert!(!second.is_cancelled());

        // A superseded generation finishing late must not clear the new entry
        manager.finish_generation(&id, ToolId::Chat, "m1");
        assert!(manager.is_generating(&id, ToolId::Chat));
        manager.finish_generation(&id, ToolId::Chat, "m3");
        assert!(!manager.is_generating(&id, ToolId::Chat));
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        use tokio_stream::StreamExt;

        let mut manager = SessionManager::new();
        let mut events = manager.subscribe();
        manager.create();
        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event, StreamEvent::SessionsChanged);
    }
}
