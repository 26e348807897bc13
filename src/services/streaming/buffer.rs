use crate::services::markdown;
use crate::services::suggestions::{self, ParsedResponse};
use crate::types::events::StreamEvent;
use crate::types::tool::ToolId;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Accumulates streamed text for one assistant message.
///
/// The final parse depends only on the concatenated text, never on where
/// chunk boundaries fell.
#[derive(Debug, Default, Clone)]
pub struct StreamAssembler {
    text: String,
    chunks: usize,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.chunks += 1;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// What the placeholder should show while streaming
    pub fn visible(&self) -> &str {
        suggestions::visible_prefix(&self.text)
    }

    pub fn finish(&self) -> ParsedResponse {
        suggestions::parse_response(&self.text)
    }
}

/// Where a streamed message lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTarget {
    pub session_id: String,
    pub tool_id: ToolId,
    pub message_id: String,
}

/// Batches UI content updates for one streaming message.
///
/// Each flush re-renders the visible prefix; an event goes out once enough
/// chunks arrived or enough time passed since the last one.
pub struct StreamingBuffer {
    sender: broadcast::Sender<StreamEvent>,
    target: MessageTarget,
    assembler: StreamAssembler,
    pending: usize,
    last_send: Instant,
}

impl StreamingBuffer {
    const FLUSH_CHUNKS: usize = 4;
    const FLUSH_INTERVAL: Duration = Duration::from_millis(80);

    pub fn new(sender: broadcast::Sender<StreamEvent>, target: MessageTarget) -> Self {
        Self {
            sender,
            target,
            assembler: StreamAssembler::new(),
            pending: 0,
            last_send: Instant::now(),
        }
    }

    pub fn target(&self) -> &MessageTarget {
        &self.target
    }

    pub fn assembler(&self) -> &StreamAssembler {
        &self.assembler
    }

    pub fn visible(&self) -> &str {
        self.assembler.visible()
    }

    /// Returns true when this push flushed an event
    pub fn push(&mut self, chunk: &str) -> bool {
        self.assembler.push(chunk);
        self.pending += 1;

        if self.pending >= Self::FLUSH_CHUNKS || self.last_send.elapsed() > Self::FLUSH_INTERVAL {
            self.flush();
            return true;
        }
        false
    }

    pub fn flush(&mut self) {
        if self.pending == 0 {
            return;
        }
        tracing::trace!(
            "Flushing {} chunks for message {}",
            self.pending,
            self.target.message_id
        );
        let _ = self.sender.send(StreamEvent::MessageContent {
            session_id: self.target.session_id.clone(),
            tool_id: self.target.tool_id,
            message_id: self.target.message_id.clone(),
            html: markdown::render_markdown(self.assembler.visible(), true),
        });
        self.pending = 0;
        self.last_send = Instant::now();
    }

    /// Parse the full text and announce the final message
    pub fn complete(mut self) -> ParsedResponse {
        self.pending = 0;
        let parsed = self.assembler.finish();
        tracing::debug!(
            "Message {} complete: {} chunks, {} suggestions",
            self.target.message_id,
            self.assembler.chunk_count(),
            parsed.suggestions.len()
        );
        let _ = self.sender.send(StreamEvent::MessageComplete {
            session_id: self.target.session_id.clone(),
            tool_id: self.target.tool_id,
            message_id: self.target.message_id.clone(),
            html: markdown::render_markdown(&parsed.content, false),
            suggestions: parsed.suggestions.clone(),
        });
        parsed
    }

    pub fn error(mut self, error: String) -> String {
        self.flush();
        let _ = self.sender.send(StreamEvent::MessageError {
            session_id: self.target.session_id.clone(),
            tool_id: self.target.tool_id,
            message_id: self.target.message_id.clone(),
            error,
        });
        self.assembler.visible().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(chunks: &[&str]) -> StreamAssembler {
        let mut assembler = StreamAssembler::new();
        for chunk in chunks {
            assembler.push(chunk);
        }
        assembler
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_the_parse() {
        let a = assemble(&["AB", "C///D"]);
        let b = assemble(&["A", "BC///D"]);
        let c = assemble(&["ABC/", "//", "D"]);
        assert_eq!(a.finish(), b.finish());
        assert_eq!(b.finish(), c.finish());
        assert_eq!(a.finish().content, "ABC");
        assert_eq!(a.finish().suggestions, vec!["D"]);
    }

    #[test]
    fn test_partial_marker_is_hidden_once_complete() {
        let mut assembler = assemble(&["Answer /"]);
        assert_eq!(assembler.visible(), "Answer /");
        assembler.push("// Q1");
        assert_eq!(assembler.visible(), "Answer ");
    }

    fn target() -> MessageTarget {
        MessageTarget {
            session_id: "s".into(),
            tool_id: ToolId::Chat,
            message_id: "m".into(),
        }
    }

    #[test]
    fn test_buffer_batches_content_events() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut buffer = StreamingBuffer::new(tx, target());
        for _ in 0..StreamingBuffer::FLUSH_CHUNKS - 1 {
            buffer.push("x");
        }
        // Nothing yet unless the interval elapsed on a slow machine
        let early = rx.try_recv().is_ok();
        let flushed = buffer.push("x");
        if !early {
            assert!(flushed);
            match rx.try_recv().unwrap() {
                StreamEvent::MessageContent { html, .. } => assert!(html.contains("xxxx")),
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_complete_sends_parsed_message() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut buffer = StreamingBuffer::new(tx, target());
        buffer.push("Done /// Next? | Again?");
        let parsed = buffer.complete();
        assert_eq!(parsed.content, "Done");

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        match last.unwrap() {
            StreamEvent::MessageComplete { suggestions, .. } => {
                assert_eq!(suggestions, vec!["Next?", "Again?"]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_error_keeps_visible_partial() {
        let (tx, mut rx) = broadcast::channel(16);
        let mut buffer = StreamingBuffer::new(tx, target());
        buffer.push("partial answer /// Q");
        let partial = buffer.error("boom".into());
        assert_eq!(partial, "partial answer ");

        let mut saw_error = false;
        while let Ok(event) = rx.try_recv() {
            if let StreamEvent::MessageError { error, .. } = event {
                assert_eq!(error, "boom");
                saw_error = true;
            }
        }
        assert!(saw_error);
    }
}
