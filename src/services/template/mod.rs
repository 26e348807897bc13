//! Template rendering service

pub mod engine;
pub mod view;

pub use engine::TemplateEngine;
pub use view::{PanelView, WorkstationView};
