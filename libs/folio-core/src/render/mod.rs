mod access;
mod markdown;
mod public;
mod sanitize;

pub use access::{has_access, TokenValidator};
pub use markdown::to_markdown;
pub use public::{DocumentSummary, PublicPage, PublicView, PublicViewer};
pub use sanitize::{AllowlistSanitizer, Sanitizer};

use crate::{
    constants::render::{LINK_SCHEMES, MEDIA_SCHEMES},
    debug, list_position,
    ordering::sort_siblings,
    Block, BlockContent, BlockType, Page,
};
use serde::Serialize;
use url::Url;

/// Display form of one block. Text fields ending in `_html` and `html` are
/// sanitized markup; `text` of a code block is raw and is escaped when the
/// block is turned into markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedBlock {
    pub id: String,
    #[serde(flatten)]
    pub kind: RenderedKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedKind {
    Text { html: String },
    Heading { level: u8, html: String },
    Quote { html: String },
    Callout { html: String },
    Code { text: String },
    BulletItem { html: String },
    NumberedItem { number: usize, html: String },
    Todo { checked: bool, html: String },
    /// always rendered collapsed
    Toggle {
        title_html: String,
        body_html: String,
        expanded: bool,
    },
    Divider,
    /// `url` is `None` when the stored source is not an http(s) url
    Image { url: Option<String> },
    Video { url: Option<String> },
    Link { url: Option<String>, label_html: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub id: String,
    pub title: String,
    pub blocks: Vec<RenderedBlock>,
}

/// The url if it parses and uses one of `schemes`.
pub(crate) fn safe_url(raw: &str, schemes: &[&str]) -> Option<String> {
    match Url::parse(raw.trim()) {
        Ok(url) if schemes.contains(&url.scheme()) => Some(url.into()),
        Ok(url) => {
            debug!("dropping url with scheme {}", url.scheme());
            None
        }
        Err(_) => None,
    }
}

/// Read-only projection of stored blocks. Never looks at editor state.
pub struct DocumentRenderer {
    sanitizer: Box<dyn Sanitizer>,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(AllowlistSanitizer)
    }
}

impl DocumentRenderer {
    pub fn new<S: Sanitizer + 'static>(sanitizer: S) -> Self {
        Self {
            sanitizer: Box::new(sanitizer),
        }
    }

    /// Render in key order; list numbers are recomputed from the runs.
    pub fn render_blocks(&self, blocks: &[Block]) -> Vec<RenderedBlock> {
        let mut blocks = blocks.to_vec();
        sort_siblings(&mut blocks);

        (0..blocks.len())
            .map(|index| RenderedBlock {
                id: blocks[index].id.clone(),
                kind: self.render_kind(&blocks, index),
            })
            .collect()
    }

    /// Article markup for a rendered page, escaping through this renderer's sanitizer.
    pub fn page_html(&self, page: &RenderedPage) -> String {
        page.to_html(self.sanitizer.as_ref())
    }

    pub fn render_page(&self, page: &Page, blocks: &[Block]) -> RenderedPage {
        RenderedPage {
            id: page.id.clone(),
            title: page.title.clone(),
            blocks: self.render_blocks(blocks),
        }
    }

    fn render_kind(&self, blocks: &[Block], index: usize) -> RenderedKind {
        let block = &blocks[index];
        let html = |text: &str| self.sanitizer.sanitize(text);

        match block.decode() {
            BlockContent::Plain(text) => match block.block_type {
                BlockType::Heading1 | BlockType::Heading2 | BlockType::Heading3 => RenderedKind::Heading {
                    level: block.block_type.heading_level().unwrap_or(1),
                    html: html(&text),
                },
                BlockType::Quote => RenderedKind::Quote { html: html(&text) },
                BlockType::Callout => RenderedKind::Callout { html: html(&text) },
                BlockType::Code => RenderedKind::Code { text },
                BlockType::BulletList => RenderedKind::BulletItem { html: html(&text) },
                BlockType::NumberedList => RenderedKind::NumberedItem {
                    number: list_position(blocks, index),
                    html: html(&text),
                },
                _ => RenderedKind::Text { html: html(&text) },
            },
            BlockContent::Todo(todo) => RenderedKind::Todo {
                checked: todo.checked,
                html: html(&todo.text),
            },
            BlockContent::Toggle(toggle) => RenderedKind::Toggle {
                title_html: html(&toggle.title),
                body_html: html(&toggle.body),
                expanded: false,
            },
            BlockContent::Link(link) => RenderedKind::Link {
                url: safe_url(&link.url, &LINK_SCHEMES),
                label_html: html(link.display_label()),
            },
            BlockContent::Media(source) => {
                let url = safe_url(&source, &MEDIA_SCHEMES);
                match block.block_type {
                    BlockType::Video => RenderedKind::Video { url },
                    _ => RenderedKind::Image { url },
                }
            }
            BlockContent::Divider => RenderedKind::Divider,
        }
    }
}

impl RenderedKind {
    fn list_tag(&self) -> Option<&'static str> {
        match self {
            Self::BulletItem { .. } => Some("ul"),
            Self::NumberedItem { .. } => Some("ol"),
            _ => None,
        }
    }

    pub fn to_html(&self, sanitizer: &dyn Sanitizer) -> String {
        let attribute = |value: &str| sanitizer.escape(value);
        match self {
            Self::Text { html } => format!("<p>{html}</p>"),
            Self::Heading { level, html } => format!("<h{level}>{html}</h{level}>"),
            Self::Quote { html } => format!("<blockquote>{html}</blockquote>"),
            Self::Callout { html } => format!(r#"<aside class="callout">{html}</aside>"#),
            Self::Code { text } => format!("<pre><code>{}</code></pre>", sanitizer.escape(text)),
            Self::BulletItem { html } | Self::NumberedItem { html, .. } => format!("<li>{html}</li>"),
            Self::Todo { checked, html } => format!(
                r#"<div class="todo"><input type="checkbox" disabled{}> {html}</div>"#,
                if *checked { " checked" } else { "" }
            ),
            Self::Toggle {
                title_html, body_html, ..
            } => format!("<details><summary>{title_html}</summary>{body_html}</details>"),
            Self::Divider => "<hr>".into(),
            Self::Image { url: Some(url) } => format!(r#"<img src="{}" alt="">"#, attribute(url)),
            Self::Video { url: Some(url) } => format!(r#"<video src="{}" controls></video>"#, attribute(url)),
            Self::Image { url: None } | Self::Video { url: None } => String::new(),
            Self::Link {
                url: Some(url),
                label_html,
            } => format!(
                r#"<p><a href="{}" rel="noopener noreferrer nofollow">{label_html}</a></p>"#,
                attribute(url)
            ),
            Self::Link { url: None, label_html } => format!("<p>{label_html}</p>"),
        }
    }
}

impl RenderedPage {
    /// Standalone article markup for the read-only post view.
    pub fn to_html(&self, sanitizer: &dyn Sanitizer) -> String {
        let mut html = format!("<article><h1>{}</h1>", sanitizer.escape(&self.title));
        let mut open: Option<&'static str> = None;

        for block in &self.blocks {
            let list = block.kind.list_tag();
            if list != open {
                if let Some(tag) = open {
                    html.push_str(&format!("</{tag}>"));
                }
                if let Some(tag) = list {
                    html.push_str(&format!("<{tag}>"));
                }
                open = list;
            }
            html.push_str(&block.kind.to_html(sanitizer));
        }
        if let Some(tag) = open {
            html.push_str(&format!("</{tag}>"));
        }
        html.push_str("</article>");

        html
    }
}
