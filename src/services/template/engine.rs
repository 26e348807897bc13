//! MiniJinja template engine wrapper

use super::view::{PanelView, WorkstationView};
use crate::services::markdown;
use crate::types::{AppError, TOOLS};
use minijinja::{context, Environment, Value};
use serde::Serialize;

/// Templates are compiled into the binary
const TEMPLATES: [(&str, &str); 4] = [
    ("workstation.html", include_str!("../../web/templates/workstation.html")),
    ("sidebar.html", include_str!("../../web/templates/sidebar.html")),
    ("panel.html", include_str!("../../web/templates/panel.html")),
    ("message.html", include_str!("../../web/templates/message.html")),
];

pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.set_debug(cfg!(debug_assertions));

        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }

        env.add_filter("markdown", render_markdown);
        env.add_filter("datetime", format_datetime);
        env.add_filter("truncate", truncate_text);

        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, template_name: &str, ctx: S) -> Result<String, AppError> {
        let template = self.env.get_template(template_name)?;
        Ok(template.render(ctx)?)
    }

    pub fn render_page(&self, view: &WorkstationView) -> Result<String, AppError> {
        self.render("workstation.html", view)
    }

    pub fn render_sidebar(&self, view: &WorkstationView) -> Result<String, AppError> {
        self.render("sidebar.html", view)
    }

    pub fn render_panel(&self, panel: &PanelView) -> Result<String, AppError> {
        self.render("panel.html", context! { panel => panel, tools => &TOOLS })
    }
}

/// Assistant content is rendered, everything else stays escaped
fn render_markdown(value: &str, streaming: Option<bool>) -> Value {
    Value::from_safe_string(markdown::render_markdown(value, streaming.unwrap_or(false)))
}

fn format_datetime(value: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| value.to_string())
}

fn truncate_text(value: &str, length: Option<usize>) -> String {
    let max_length = length.unwrap_or(50);
    match value.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
