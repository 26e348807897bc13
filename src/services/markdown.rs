//! Markdown to block rendering.
//!
//! Model output is parsed once into a flat list of [`Block`]s and each
//! block kind has its own renderer. Raw HTML from the model is escaped and
//! link targets outside a small scheme allowlist are replaced with `#`.

use pulldown_cmark::{html, Alignment, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Already-rendered HTML for ordinary prose
    Text(String),
    Code {
        language: Option<String>,
        code: String,
    },
    Table(Table),
    /// Mermaid source
    Diagram { source: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub head: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

enum Capture {
    None,
    Code { language: Option<String>, code: String },
    Table { table: Table, row: Vec<String>, cell: Vec<Event<'static>>, in_head: bool },
}

pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut prose: Vec<Event<'static>> = Vec::new();
    let mut capture = Capture::None;

    for event in Parser::new_ext(markdown, options()) {
        let event = sanitize(event).into_static();

        match (&mut capture, event) {
            (Capture::None, Event::Start(Tag::CodeBlock(kind))) => {
                flush_prose(&mut prose, &mut blocks);
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                capture = Capture::Code {
                    language,
                    code: String::new(),
                };
            }
            (Capture::None, Event::Start(Tag::Table(alignments))) => {
                flush_prose(&mut prose, &mut blocks);
                capture = Capture::Table {
                    table: Table {
                        alignments,
                        ..Default::default()
                    },
                    row: Vec::new(),
                    cell: Vec::new(),
                    in_head: false,
                };
            }
            (Capture::None, event) => prose.push(event),

            (Capture::Code { code, .. }, Event::Text(text)) => code.push_str(&text),
            (Capture::Code { .. }, Event::End(TagEnd::CodeBlock)) => {
                if let Capture::Code { language, code } = std::mem::replace(&mut capture, Capture::None) {
                    blocks.push(code_block(language, code));
                }
            }
            (Capture::Code { .. }, _) => {}

            (Capture::Table { in_head, .. }, Event::Start(Tag::TableHead)) => *in_head = true,
            (Capture::Table { table, row, in_head, .. }, Event::End(TagEnd::TableHead)) => {
                table.head = std::mem::take(row);
                *in_head = false;
            }
            (Capture::Table { table, row, in_head, .. }, Event::End(TagEnd::TableRow)) => {
                if !*in_head {
                    table.rows.push(std::mem::take(row));
                }
            }
            (Capture::Table { row, cell, .. }, Event::End(TagEnd::TableCell)) => {
                let mut out = String::new();
                html::push_html(&mut out, std::mem::take(cell).into_iter());
                row.push(out);
            }
            (Capture::Table { .. }, Event::End(TagEnd::Table)) => {
                if let Capture::Table { table, .. } = std::mem::replace(&mut capture, Capture::None) {
                    blocks.push(Block::Table(table));
                }
            }
            (Capture::Table { .. }, Event::Start(Tag::TableRow | Tag::TableCell)) => {}
            (Capture::Table { cell, .. }, event) => cell.push(event),
        }
    }

    // An unterminated fence while streaming still ends up as a block
    match capture {
        Capture::Code { language, code } => blocks.push(code_block(language, code)),
        Capture::Table { table, .. } => blocks.push(Block::Table(table)),
        Capture::None => {}
    }
    flush_prose(&mut prose, &mut blocks);
    blocks
}

fn code_block(language: Option<String>, code: String) -> Block {
    match language.as_deref() {
        Some("mermaid") => Block::Diagram { source: code },
        _ => Block::Code { language, code },
    }
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url, false),
            title,
            id,
        }),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url, true),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_url(url: CowStr<'_>, image: bool) -> CowStr<'_> {
    if is_allowed_url(&url, image) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

/// Relative targets pass; absolute ones need http, https or mailto.
/// Images may also use `data:image/`.
fn is_allowed_url(url: &str, image: bool) -> bool {
    let url = url.trim();
    match url.find([':', '/', '?', '#']) {
        Some(idx) if url[idx..].starts_with(':') => {
            let scheme = url[..idx].to_ascii_lowercase();
            match scheme.as_str() {
                "http" | "https" | "mailto" => true,
                "data" => image && url[idx + 1..].to_ascii_lowercase().starts_with("image/"),
                _ => false,
            }
        }
        _ => true,
    }
}

fn flush_prose(prose: &mut Vec<Event<'static>>, blocks: &mut Vec<Block>) {
    if prose.is_empty() {
        return;
    }
    let mut out = String::new();
    html::push_html(&mut out, prose.drain(..));
    if !out.trim().is_empty() {
        blocks.push(Block::Text(out));
    }
}

/// Render a list of blocks. Diagrams are shown as source while `streaming`.
pub fn render_blocks(blocks: &[Block], streaming: bool) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Text(html) => out.push_str(html),
            Block::Code { language, code } => render_code(&mut out, language.as_deref(), code),
            Block::Table(table) => render_table(&mut out, table),
            Block::Diagram { source } if streaming => render_code(&mut out, Some("mermaid"), source),
            Block::Diagram { source } => render_diagram(&mut out, source),
        }
    }
    out
}

pub fn render_markdown(markdown: &str, streaming: bool) -> String {
    render_blocks(&parse_blocks(markdown), streaming)
}

fn render_code(out: &mut String, language: Option<&str>, code: &str) {
    let label = language.unwrap_or("code");
    out.push_str(&format!(
        r#"<div class="code-block"><div class="block-header"><span class="code-lang">{}</span><button class="copy-code" type="button">Copy</button></div><pre><code class="language-{}">{}</code></pre></div>"#,
        html_escape::encode_text(label),
        html_escape::encode_double_quoted_attribute(label),
        html_escape::encode_text(code),
    ));
}

fn render_table(out: &mut String, table: &Table) {
    let align = |idx: usize| match table.alignments.get(idx) {
        Some(Alignment::Left) => r#" style="text-align:left""#,
        Some(Alignment::Center) => r#" style="text-align:center""#,
        Some(Alignment::Right) => r#" style="text-align:right""#,
        _ => "",
    };

    out.push_str(r#"<div class="table-block"><button class="copy-table" type="button">Copy table</button><table>"#);
    if !table.head.is_empty() {
        out.push_str("<thead><tr>");
        for (idx, cell) in table.head.iter().enumerate() {
            out.push_str(&format!("<th{}>{}</th>", align(idx), cell));
        }
        out.push_str("</tr></thead>");
    }
    out.push_str("<tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for (idx, cell) in row.iter().enumerate() {
            out.push_str(&format!("<td{}>{}</td>", align(idx), cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
}

fn render_diagram(out: &mut String, source: &str) {
    out.push_str(&format!(
        r#"<div class="diagram-block"><div class="block-actions"><button class="copy-diagram" type="button">Copy image</button><button class="download-diagram" type="button">Download SVG</button></div><pre class="mermaid">{}</pre></div>"#,
        html_escape::encode_text(source),
    ));
}
