use crate::config::Config;
use crate::services::provider::{ContentProvider, GeminiClient};
use crate::services::template::TemplateEngine;
use crate::services::{Conversation, Relay, SessionManager};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<Relay>,
    pub sessions: Arc<RwLock<SessionManager>>,
    pub conversation: Conversation,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        tracing::info!("[STATE] Initializing AppState...");
        tracing::info!("[STATE]   Provider: {}", config.api_base);
        tracing::info!("[STATE]   Default model: {}", config.default_model);
        if !config.has_credential() {
            tracing::warn!("[STATE] GOOGLE_API_KEY is not set, relay calls will fail");
        }

        let provider = Arc::new(GeminiClient::from_config(&config)?);
        Self::with_provider(config, provider)
    }

    /// Build state around any provider implementation
    pub fn with_provider(config: Config, provider: Arc<dyn ContentProvider>) -> Result<Self> {
        let relay = Arc::new(Relay::new(
            provider,
            config.api_key.clone(),
            config.default_model.clone(),
        ));
        let sessions = Arc::new(RwLock::new(SessionManager::new()));
        let conversation = Conversation::new(
            relay.clone(),
            sessions.clone(),
            config.history_window,
            config.title_model.clone(),
        );
        let templates = TemplateEngine::new()?;

        Ok(Self {
            config: Arc::new(config),
            relay,
            sessions,
            conversation,
            templates: Arc::new(templates),
        })
    }
}
