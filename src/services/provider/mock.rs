//! Scripted provider for tests

use super::{ContentProvider, GenerateRequest, TextStream};
use crate::types::AppError;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub enum Script {
    Chunks(Vec<String>),
    /// Chunks followed by a mid-stream failure
    FailAfter(Vec<String>, String),
    /// Rejected before any text
    Reject(String),
    /// Never finishes after the given chunks
    Hang(Vec<String>),
}

pub struct MockProvider {
    scripts: Mutex<Vec<Script>>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<GenerateRequest>>,
    pub listing: Value,
    pub delay: Duration,
}

impl MockProvider {
    /// Scripts are consumed in order; the last one repeats
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            listing: Value::Null,
            delay: Duration::ZERO,
        }
    }

    pub fn chunks(chunks: &[&str]) -> Self {
        Self::new(vec![Script::Chunks(
            chunks.iter().map(|c| c.to_string()).collect(),
        )])
    }

    pub fn with_listing(mut self, listing: Value) -> Self {
        self.listing = listing;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn next_script(&self) -> Script {
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.len() > 1 {
            scripts.remove(0)
        } else {
            match scripts.first() {
                Some(Script::Chunks(c)) => Script::Chunks(c.clone()),
                Some(Script::FailAfter(c, e)) => Script::FailAfter(c.clone(), e.clone()),
                Some(Script::Reject(e)) => Script::Reject(e.clone()),
                Some(Script::Hang(c)) => Script::Hang(c.clone()),
                None => Script::Chunks(Vec::new()),
            }
        }
    }
}

#[async_trait]
impl ContentProvider for MockProvider {
    async fn stream_generate(
        &self,
        _api_key: &str,
        request: GenerateRequest,
    ) -> Result<TextStream, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let delay = self.delay;

        let (chunks, tail) = match self.next_script() {
            Script::Reject(message) => return Err(AppError::provider(500, message)),
            Script::Chunks(chunks) => (chunks, None),
            Script::FailAfter(chunks, error) => (chunks, Some(Some(error))),
            Script::Hang(chunks) => (chunks, Some(None)),
        };

        let stream = async_stream::stream! {
            for chunk in chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(chunk);
            }
            match tail {
                Some(Some(error)) => yield Err(AppError::provider(500, error)),
                Some(None) => std::future::pending::<()>().await,
                None => {}
            }
        };
        Ok(stream.boxed())
    }

    async fn list_models(&self, _api_key: &str) -> Result<Value, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.listing.clone())
    }
}

/// Serve `app` on an ephemeral local port and return its API base URL
pub async fn serve_upstream(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}/v1beta", addr)
}

/// Upstream answering every request with 200 `text/event-stream`, each
/// slice written as its own body frame
pub fn sse_upstream(frames: &'static [&'static str]) -> axum::Router {
    axum::Router::new().fallback(move || async move {
        let body = futures::stream::iter(
            frames.iter().map(|frame| Ok::<_, std::io::Error>(*frame)),
        );
        (
            [(axum::http::header::CONTENT_TYPE, "text/event-stream")],
            axum::body::Body::from_stream(body),
        )
    })
}
