//! Gemini `generativelanguage` REST client

use super::stream::{ErrorBody, GenerateChunk, SseDecoder};
use super::{ContentProvider, GenerateRequest, Part, TextStream};
use crate::config::Config;
use crate::types::AppError;
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::HeaderValue, Client, Response};
use serde::Serialize;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: [UserContent<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct UserContent<'a> {
    role: &'static str,
    parts: &'a [Part],
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl<'a> GenerateContentBody<'a> {
    fn new(request: &'a GenerateRequest) -> Self {
        Self {
            contents: [UserContent {
                role: "user",
                parts: &request.parts,
            }],
            system_instruction: request
                .system_instruction
                .as_deref()
                .map(|text| SystemInstruction {
                    parts: [TextPart { text }],
                }),
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_ONLY_HIGH",
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::new(client, config.api_base.clone()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    fn key_header(api_key: &str) -> Result<HeaderValue, AppError> {
        HeaderValue::from_str(api_key)
            .map_err(|_| AppError::InvalidRequest("API key contains invalid characters".into()))
    }
}

/// Turn a non-2xx response into a provider error that keeps the status code
async fn error_from_response(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);
    AppError::provider(
        status.as_u16(),
        format!(
            "[{} {}] {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            detail.trim()
        ),
    )
}

fn chunk_text(payload: &str) -> Result<Option<String>, AppError> {
    let chunk: GenerateChunk = serde_json::from_str(payload)?;
    if let Some(error) = chunk.error {
        return Err(AppError::provider(
            error.code,
            format!("[{} {}] {}", error.code, error.status, error.message),
        ));
    }
    let text = chunk.text();
    if text.is_empty() {
        if let Some(reason) = chunk.block_reason() {
            return Err(AppError::provider(
                200,
                format!("Response was blocked due to {}", reason),
            ));
        }
        return Ok(None);
    }
    Ok(Some(text))
}

#[async_trait]
impl ContentProvider for GeminiClient {
    async fn stream_generate(
        &self,
        api_key: &str,
        request: GenerateRequest,
    ) -> Result<TextStream, AppError> {
        let body = GenerateContentBody::new(&request);
        tracing::info!(
            "Streaming from {} with {} parts",
            request.model,
            request.parts.len()
        );

        let response = self
            .client
            .post(self.stream_url(&request.model))
            .header(API_KEY_HEADER, Self::key_header(api_key)?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let mut bytes = response.bytes_stream();
        let stream = try_stream! {
            let mut decoder = SseDecoder::new();
            while let Some(next) = bytes.next().await {
                let next = next?;
                for payload in decoder.push(&next) {
                    tracing::trace!("chunk: {}", payload);
                    if let Some(text) = chunk_text(&payload)? {
                        yield text;
                    }
                }
            }
            if let Some(payload) = decoder.finish() {
                if let Some(text) = chunk_text(&payload)? {
                    yield text;
                }
            }
        };

        Ok(stream.boxed())
    }

    async fn list_models(&self, api_key: &str) -> Result<serde_json::Value, AppError> {
        let response = self
            .client
            .get(self.models_url())
            .header(API_KEY_HEADER, Self::key_header(api_key)?)
            .send()
            .await?;
        // Error payloads are passed through to the caller
        Ok(response.json().await?)
    }
}
