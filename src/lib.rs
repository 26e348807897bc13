// Core modules
pub mod config;
pub mod services;
pub mod state;
pub mod types;
pub mod web;

// Re-exports
pub use config::Config;
pub use services::template::engine::TemplateEngine;
pub use state::AppState;
