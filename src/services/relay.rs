//! Stream relay: request shaping in front of the content provider

use crate::services::provider::{ContentProvider, GenerateRequest, Part, TextStream};
use crate::types::{AppError, Attachment, RelayRequest};
use futures::{stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;

/// Appended to every question so responses end with parseable suggestions
pub const ANSWER_FORMAT_DIRECTIVE: &str = "\
----------------
[Answer format]
After answering, start a new line and write 3 follow-up questions.
That line must begin with \"///\" and the three questions must be separated by \"|\".
Do not use numbered lists (1. 2. 3.).

Example:
/// First follow-up question | Second follow-up question | Third follow-up question";

pub struct Relay {
    provider: Arc<dyn ContentProvider>,
    api_key: Option<String>,
    default_model: String,
}

impl Relay {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        api_key: Option<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            api_key,
            default_model: default_model.into(),
        }
    }

    fn credential(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or(AppError::MissingCredential)
    }

    /// Ordered prompt parts: attachments, history, then the question
    pub fn build_parts(request: &RelayRequest) -> Vec<Part> {
        let mut parts: Vec<Part> = request.files.iter().map(attachment_part).collect();

        if let Some(history) = request.history.as_deref().filter(|h| !h.trim().is_empty()) {
            parts.push(Part::text(format!(
                "Conversation history for reference:\n{}",
                history
            )));
        }

        let question = if request.message.trim().is_empty() {
            "(see attached files)"
        } else {
            request.message.as_str()
        };
        parts.push(Part::text(format!(
            "User question: {}\n\n{}",
            question, ANSWER_FORMAT_DIRECTIVE
        )));
        parts
    }

    pub fn build_request(&self, request: &RelayRequest) -> GenerateRequest {
        GenerateRequest {
            model: request
                .model_name
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.default_model.clone()),
            system_instruction: request
                .system_instruction
                .clone()
                .filter(|s| !s.trim().is_empty()),
            parts: Self::build_parts(request),
        }
    }

    /// Open the provider stream. Fails without contacting the provider when
    /// no credential is configured or the request is empty.
    ///
    /// The first item is pulled before returning, so a failure that arrives
    /// ahead of any text (a blocked prompt, an in-band quota error) is
    /// reported here rather than inside the stream.
    pub async fn open(&self, request: RelayRequest) -> Result<TextStream, AppError> {
        let api_key = self.credential()?;
        if request.message.trim().is_empty() && request.files.is_empty() {
            return Err(AppError::InvalidRequest(
                "a message or at least one file is required".into(),
            ));
        }

        let generate = self.build_request(&request);
        tracing::info!(
            "Relaying to {} ({} files, history: {})",
            generate.model,
            request.files.len(),
            request.history.as_deref().is_some_and(|h| !h.is_empty())
        );
        let mut upstream = self.provider.stream_generate(api_key, generate).await?;
        match upstream.next().await {
            Some(Err(e)) => Err(e),
            Some(Ok(first)) => Ok(stream::once(async move { Ok::<_, AppError>(first) })
                .chain(upstream)
                .boxed()),
            None => Ok(stream::empty().boxed()),
        }
    }

    /// Run a request to completion and return the whole text
    pub async fn complete(&self, request: RelayRequest) -> Result<String, AppError> {
        let mut stream = self.open(request).await?;
        let mut text = String::new();
        while let Some(chunk) = stream.next().await {
            text.push_str(&chunk?);
        }
        Ok(text)
    }

    pub async fn list_models(&self) -> Result<Value, AppError> {
        let api_key = self.credential()?;
        self.provider.list_models(api_key).await
    }
}

fn attachment_part(file: &Attachment) -> Part {
    if file.is_text {
        Part::text(format!("=== file: {} ===\n{}\n=== end ===", file.name, file.data))
    } else {
        Part::InlineData {
            mime_type: file.mime_type.clone(),
            data: file.data.clone(),
        }
    }
}
