use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub host: String,
    pub port: u16,
    pub static_dir: String,

    // Provider configuration
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: String,
    pub default_model: String,
    pub title_model: String,

    // Conversation
    pub history_window: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let or_default = |key: &str, fallback: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback)
        };

        Ok(Config {
            host: or_default("HOST", defaults.host),
            port: or_default("PORT", defaults.port.to_string()).parse()?,
            static_dir: or_default("STATIC_DIR", defaults.static_dir),

            api_key: lookup("GOOGLE_API_KEY").filter(|k| !k.trim().is_empty()),
            api_base: or_default("GEMINI_API_BASE", defaults.api_base)
                .trim_end_matches('/')
                .to_string(),
            default_model: or_default("DEFAULT_MODEL", defaults.default_model),
            title_model: or_default("TITLE_MODEL", defaults.title_model),

            history_window: or_default("HISTORY_WINDOW", defaults.history_window.to_string())
                .parse()?,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: "src/web/static".to_string(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            default_model: "gemini-1.5-flash".to_string(),
            title_model: "gemini-3-flash-preview".to_string(),
            history_window: 6,
        }
    }
}
