//! Generative-content provider seam

pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod models;
mod stream;

pub use gemini::GeminiClient;
pub use models::{ModelInfo, ModelList};

use crate::types::AppError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;

/// One piece of prompt content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::InlineData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub parts: Vec<Part>,
}

/// Incremental text fragments, in provider order
pub type TextStream = BoxStream<'static, Result<String, AppError>>;

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Start a streaming generation. Errors returned here happen before any
    /// text was produced; errors inside the stream happen mid-flight.
    async fn stream_generate(
        &self,
        api_key: &str,
        request: GenerateRequest,
    ) -> Result<TextStream, AppError>;

    /// Raw model listing as returned by the provider
    async fn list_models(&self, api_key: &str) -> Result<serde_json::Value, AppError>;
}
