//! Conversational engine: send, stream consume, finalize, title generation

use crate::services::relay::Relay;
use crate::services::session::SessionManager;
use crate::services::streaming::{MessageTarget, StreamingBuffer};
use crate::services::suggestions;
use crate::types::{
    AppError, Message, RelayRequest, SendReceipt, SendRequest, Session, StreamEvent, ToolId,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

const TITLE_PROMPT: &str = "Summarize the following message as a very short title \
(at most 6 words). Reply with the title only, without punctuation: ";

#[derive(Clone)]
pub struct Conversation {
    relay: Arc<Relay>,
    sessions: Arc<RwLock<SessionManager>>,
    history_window: usize,
    title_model: String,
}

impl Conversation {
    pub fn new(
        relay: Arc<Relay>,
        sessions: Arc<RwLock<SessionManager>>,
        history_window: usize,
        title_model: impl Into<String>,
    ) -> Self {
        Self {
            relay,
            sessions,
            history_window,
            title_model: title_model.into(),
        }
    }

    /// Append the user turn and a streaming placeholder, then generate in
    /// the background. Any generation already running for the same panel
    /// is cancelled first.
    pub async fn send(
        &self,
        session_id: &str,
        tool: ToolId,
        request: SendRequest,
    ) -> Result<SendReceipt, AppError> {
        if request.text.trim().is_empty() && request.files.is_empty() {
            return Err(AppError::BadInput("message text or files required".into()));
        }

        let user = Message::new_user(request.text.clone(), request.files.clone());
        let placeholder = Message::placeholder();
        let message_id = placeholder.id.clone();

        let (relay_request, first_message, token) = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.get(session_id)?;
            let history = history_summary(&before, tool, self.history_window);
            let first_message = before.is_empty();

            sessions.cancel_generation(session_id, tool);
            sessions.update_session(session_id, |s| s.push_exchange(tool, user, placeholder))?;
            let token = sessions.begin_generation(session_id, tool, &message_id);

            let descriptor = tool.descriptor();
            let relay_request = RelayRequest {
                message: request.text.clone(),
                history: Some(history).filter(|h| !h.is_empty()),
                files: request.files,
                model_name: Some(descriptor.model.to_string()),
                system_instruction: Some(descriptor.system_prompt.to_string()),
            };
            (relay_request, first_message, token)
        };

        tracing::info!(
            "Send to {} in session {} (message {})",
            tool,
            session_id,
            message_id
        );

        let target = MessageTarget {
            session_id: session_id.to_string(),
            tool_id: tool,
            message_id: message_id.clone(),
        };
        let engine = self.clone();
        tokio::spawn(async move { engine.run_generation(target, relay_request, token).await });

        if first_message && !request.text.trim().is_empty() {
            let engine = self.clone();
            let session_id = session_id.to_string();
            let text = request.text;
            tokio::spawn(async move { engine.generate_title(&session_id, &text).await });
        }

        Ok(SendReceipt {
            session_id: session_id.to_string(),
            message_id,
        })
    }

    pub async fn run_generation(
        &self,
        target: MessageTarget,
        request: RelayRequest,
        token: CancellationToken,
    ) {
        let sender = {
            let sessions = self.sessions.read().await;
            sessions.publish(StreamEvent::MessageStarted {
                session_id: target.session_id.clone(),
                tool_id: target.tool_id,
                message_id: target.message_id.clone(),
            });
            sessions.sender()
        };
        let mut buffer = StreamingBuffer::new(sender, target.clone());

        let result = tokio::select! {
            _ = token.cancelled() => {
                tracing::info!("Generation {} cancelled", target.message_id);
                Ok(())
            }
            result = self.consume(&mut buffer, request) => result,
        };

        match result {
            Ok(()) => {
                let parsed = buffer.complete();
                self.store(&target, |m| {
                    m.content = parsed.content;
                    m.suggestions = parsed.suggestions;
                    m.streaming = false;
                })
                .await;
            }
            Err(e) => {
                tracing::error!("Generation {} failed: {}", target.message_id, e);
                let partial = buffer.error(e.user_message());
                self.store(&target, |m| {
                    m.content = partial;
                    m.streaming = false;
                })
                .await;
            }
        }

        self.sessions.write().await.finish_generation(
            &target.session_id,
            target.tool_id,
            &target.message_id,
        );
    }

    async fn consume(
        &self,
        buffer: &mut StreamingBuffer,
        request: RelayRequest,
    ) -> Result<(), AppError> {
        let mut stream = self.relay.open(request).await?;
        while let Some(chunk) = stream.next().await {
            // The snapshot follows the broadcast throttle; completion stores the rest
            if buffer.push(&chunk?) {
                let visible = buffer.visible().to_string();
                self.store(buffer.target(), |m| m.content = visible).await;
            }
        }
        Ok(())
    }

    /// Replace the target message inside a fresh session snapshot
    async fn store<F>(&self, target: &MessageTarget, f: F)
    where
        F: FnOnce(&mut Message),
    {
        let mut sessions = self.sessions.write().await;
        let updated = sessions.update_session(&target.session_id, |s| {
            if s.update_message(target.tool_id, &target.message_id, f) {
                Ok(())
            } else {
                Err(AppError::Conflict("message no longer in history".into()))
            }
        });
        if let Err(e) = updated {
            tracing::debug!("Dropping update for {}: {}", target.message_id, e);
        }
    }

    /// Best-effort: failures are logged and the title is left unchanged
    pub async fn generate_title(&self, session_id: &str, text: &str) {
        let request = RelayRequest {
            message: format!("{}{}", TITLE_PROMPT, text),
            model_name: Some(self.title_model.clone()),
            ..Default::default()
        };

        let title = match self.relay.complete(request).await {
            Ok(raw) => clean_title(&raw),
            Err(e) => {
                tracing::warn!("Title generation failed for {}: {}", session_id, e);
                return;
            }
        };
        if title.is_empty() {
            return;
        }

        if let Err(e) = self.sessions.write().await.rename(session_id, &title) {
            tracing::warn!("Could not apply title to {}: {}", session_id, e);
        }
    }
}

/// `"{role}: {content}"` lines for the last `window` messages of a tool
pub fn history_summary(session: &Session, tool: ToolId, window: usize) -> String {
    let history = session.history(tool);
    history[history.len().saturating_sub(window)..]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clean_title(raw: &str) -> String {
    let parsed = suggestions::parse_response(raw);
    parsed
        .content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches(|c: char| c == '"' || c == '*' || c == '#' || c == '\'')
        .trim()
        .to_string()
}
