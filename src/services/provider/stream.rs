//! Server-Sent Events decoding for `streamGenerateContent?alt=sse`

use serde::Deserialize;

/// Splits a raw byte stream into SSE `data:` payloads.
///
/// Bytes are buffered until a full event (terminated by a blank line) is
/// available, so UTF-8 sequences split across network reads stay intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning the data payloads of every completed event
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some((end, delimiter)) = find_event_end(&self.buf) {
            let block: Vec<u8> = self.buf.drain(..end + delimiter).collect();
            if let Some(data) = event_data(&block[..end]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Whatever is left once the byte stream ended
    pub fn finish(&mut self) -> Option<String> {
        let block = std::mem::take(&mut self.buf);
        event_data(&block)
    }
}

fn find_event_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| (p, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn event_data(block: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(block);
    let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|d| d.strip_prefix(' ').unwrap_or(d))
        .collect();
    if data.is_empty() {
        return None;
    }
    let joined = data.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One `GenerateContentResponse` chunk
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Wrapper for error bodies of non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

impl GenerateChunk {
    /// Text of the first candidate
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Why the provider refused to produce text, if it did
    pub fn block_reason(&self) -> Option<&str> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Some(reason);
        }
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|reason| matches!(*reason, "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_handles_split_events() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\":").is_empty());
        let payloads = decoder.push(b"1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#, r#"{"b":2}"#]);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decoder_handles_crlf_and_tail() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: one\r\n\r\ndata: two");
        assert_eq!(payloads, vec!["one"]);
        assert_eq!(decoder.finish().as_deref(), Some("two"));
    }

    #[test]
    fn test_decoder_keeps_multibyte_characters_whole() {
        let event = "data: {\"t\":\"你好\"}\n\n".as_bytes();
        let (head, tail) = event.split_at(14);
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec![r#"{"t":"你好"}"#]);
    }

    #[test]
    fn test_chunk_text_and_block_reason() {
        let chunk: GenerateChunk = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.text(), "Hello");
        assert!(chunk.block_reason().is_none());

        let blocked: GenerateChunk =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(blocked.text(), "");
        assert_eq!(blocked.block_reason(), Some("SAFETY"));

        let stopped: GenerateChunk =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"STOP"}]}"#).unwrap();
        assert!(stopped.block_reason().is_none());
    }
}
