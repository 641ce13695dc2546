//! Mapping between a block's structured state and its single-string payload.
//!
//! Decoders never fail: a payload that does not have the expected shape is
//! read as plain text so historical data can always be displayed.

use super::{Block, BlockType};
use crate::constants::codec::{LINK_SEPARATOR, TODO_CHECKED, TODO_UNCHECKED, TOGGLE_SENTINEL};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub checked: bool,
    pub text: String,
}

impl TodoItem {
    pub fn new<S: Into<String>>(checked: bool, text: S) -> Self {
        Self {
            checked,
            text: text.into(),
        }
    }

    pub fn decode(content: &str) -> Self {
        Self::parse(content).unwrap_or_else(|| Self::new(false, content))
    }

    fn parse(content: &str) -> Option<Self> {
        let rest = content.strip_prefix('[')?;
        let mut chars = rest.chars();
        let checked = match chars.next()? {
            ' ' => false,
            'x' | 'X' => true,
            _ => return None,
        };
        let rest = chars.as_str().strip_prefix(']')?;
        // one separating space belongs to the marker, anything else is trimmed
        let text = match rest.strip_prefix(' ') {
            Some(text) => text,
            None => rest.trim_start(),
        };

        Some(Self::new(checked, text))
    }

    pub fn encode(&self) -> String {
        let marker = if self.checked { TODO_CHECKED } else { TODO_UNCHECKED };
        format!("{marker}{}", self.text)
    }

    pub fn toggled(&self) -> Self {
        Self::new(!self.checked, self.text.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleSection {
    pub title: String,
    pub body: String,
}

impl ToggleSection {
    pub fn new<T: Into<String>, B: Into<String>>(title: T, body: B) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn decode(content: &str) -> Self {
        match content.split_once(TOGGLE_SENTINEL) {
            Some((title, body)) => Self::new(title, body),
            None => Self::new(content, ""),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}{TOGGLE_SENTINEL}{}", self.title, self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub url: String,
    pub label: Option<String>,
}

impl LinkTarget {
    pub fn new<U: Into<String>>(url: U, label: Option<String>) -> Self {
        Self {
            url: url.into(),
            label: label.filter(|label| !label.is_empty()),
        }
    }

    pub fn decode(content: &str) -> Self {
        match content.split_once(LINK_SEPARATOR) {
            Some((url, label)) => Self::new(url.trim(), Some(label.trim().to_owned())),
            None => Self::new(content.trim(), None),
        }
    }

    pub fn encode(&self) -> String {
        match &self.label {
            Some(label) => format!("{}{LINK_SEPARATOR}{label}", self.url),
            None => self.url.clone(),
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.url)
    }
}

/// Decoded view of a block payload, tagged by the rule its type follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    /// text, headings, quote, callout, code and list items
    Plain(String),
    Todo(TodoItem),
    Toggle(ToggleSection),
    Link(LinkTarget),
    /// image or video source
    Media(String),
    Divider,
}

impl BlockContent {
    pub fn decode(block_type: BlockType, content: &str) -> Self {
        match block_type {
            BlockType::Todo => Self::Todo(TodoItem::decode(content)),
            BlockType::Toggle => Self::Toggle(ToggleSection::decode(content)),
            BlockType::Link => Self::Link(LinkTarget::decode(content)),
            BlockType::Image | BlockType::Video => Self::Media(content.trim().to_owned()),
            BlockType::Divider => Self::Divider,
            _ => Self::Plain(content.to_owned()),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Plain(text) | Self::Media(text) => text.clone(),
            Self::Todo(todo) => todo.encode(),
            Self::Toggle(toggle) => toggle.encode(),
            Self::Link(link) => link.encode(),
            Self::Divider => String::new(),
        }
    }
}

/// 1-based position of `blocks[index]` inside the run of contiguous
/// same-typed siblings that ends at it. Numbered lists render this value; it
/// is never persisted.
pub fn list_position(blocks: &[Block], index: usize) -> usize {
    let Some(block) = blocks.get(index) else {
        return 0;
    };

    1 + blocks[..index]
        .iter()
        .rev()
        .take_while(|prev| prev.block_type == block.block_type)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_decoding() {
        assert_eq!(TodoItem::decode("[x] Buy milk"), TodoItem::new(true, "Buy milk"));
        assert_eq!(TodoItem::decode("[ ] Buy milk"), TodoItem::new(false, "Buy milk"));
        assert_eq!(TodoItem::decode("[X] shout"), TodoItem::new(true, "shout"));
        assert_eq!(TodoItem::decode("[x]tight"), TodoItem::new(true, "tight"));
        assert_eq!(TodoItem::decode("[x]\t  tabbed"), TodoItem::new(true, "tabbed"));
        assert_eq!(TodoItem::decode("[x] "), TodoItem::new(true, ""));

        // anything else degrades to unchecked text
        assert_eq!(TodoItem::decode("Buy milk"), TodoItem::new(false, "Buy milk"));
        assert_eq!(TodoItem::decode("[y] maybe"), TodoItem::new(false, "[y] maybe"));
        assert_eq!(TodoItem::decode("[x"), TodoItem::new(false, "[x"));
        assert_eq!(TodoItem::decode(""), TodoItem::new(false, ""));
    }

    #[test]
    fn todo_toggle_scenario() {
        let todo = TodoItem::decode("[x] Buy milk");
        assert!(todo.checked);
        assert_eq!(todo.text, "Buy milk");
        assert_eq!(todo.toggled().encode(), "[ ] Buy milk");
    }

    #[test]
    fn todo_payloads_are_stable() {
        for payload in ["[x] a", "[ ] b c", "[ ] ", "[x]  leading space", "[ ] multi\nline"] {
            let todo = TodoItem::decode(payload);
            assert_eq!(todo.encode(), payload);
        }
        // marker case is normalized on encode
        assert_eq!(TodoItem::decode("[X] loud").encode(), "[x] loud");

        for (checked, text) in [(true, ""), (false, " padded"), (true, "[x] nested")] {
            let todo = TodoItem::new(checked, text);
            assert_eq!(TodoItem::decode(&todo.encode()), todo);
        }
    }

    #[test]
    fn toggle_round_trip() {
        let toggle = ToggleSection::new("Title", "Body\nwith lines");
        assert_eq!(toggle.encode(), "Title\n---\nBody\nwith lines");
        assert_eq!(ToggleSection::decode(&toggle.encode()), toggle);

        let empty = ToggleSection::new("", "");
        assert_eq!(ToggleSection::decode(&empty.encode()), empty);

        // body keeps any later sentinel verbatim
        let nested = ToggleSection::new("a", "b\n---\nc");
        assert_eq!(ToggleSection::decode(&nested.encode()), nested);
    }

    #[test]
    fn toggle_without_sentinel() {
        assert_eq!(ToggleSection::decode("just a title"), ToggleSection::new("just a title", ""));
        assert_eq!(ToggleSection::decode("a\n--\nb"), ToggleSection::new("a\n--\nb", ""));
    }

    #[test]
    fn link_payloads() {
        assert_eq!(LinkTarget::decode("https://a.io"), LinkTarget::new("https://a.io", None));
        assert_eq!(
            LinkTarget::decode("https://a.io|Home"),
            LinkTarget::new("https://a.io", Some("Home".into()))
        );
        assert_eq!(LinkTarget::decode("https://a.io|").label, None);
        assert_eq!(LinkTarget::decode("https://a.io|A|B").display_label(), "A|B");
        assert_eq!(LinkTarget::decode("https://a.io").display_label(), "https://a.io");

        let link = LinkTarget::new("https://a.io", Some("Home".into()));
        assert_eq!(LinkTarget::decode(&link.encode()), link);
    }

    #[test]
    fn tagged_decoding() {
        assert_eq!(
            BlockContent::decode(BlockType::Heading2, "[x] not a todo"),
            BlockContent::Plain("[x] not a todo".into())
        );
        assert_eq!(BlockContent::decode(BlockType::Divider, "junk"), BlockContent::Divider);
        assert_eq!(
            BlockContent::decode(BlockType::Image, " https://img.io/a.png "),
            BlockContent::Media("https://img.io/a.png".into())
        );

        let content = BlockContent::Todo(TodoItem::new(true, "done"));
        assert_eq!(BlockContent::decode(BlockType::Todo, &content.encode()), content);
    }

    #[test]
    fn numbered_runs_restart() {
        let blocks = [
            Block::with_id("0", "p", BlockType::BulletList, 0).with_content("a"),
            Block::with_id("1", "p", BlockType::NumberedList, 1).with_content("x"),
            Block::with_id("2", "p", BlockType::NumberedList, 2).with_content("y"),
            Block::with_id("3", "p", BlockType::Text, 3).with_content("note"),
            Block::with_id("4", "p", BlockType::NumberedList, 4).with_content("z"),
        ];

        assert_eq!(list_position(&blocks, 1), 1);
        assert_eq!(list_position(&blocks, 2), 2);
        assert_eq!(list_position(&blocks, 4), 1);
        assert_eq!(list_position(&blocks, 0), 1);
        assert_eq!(list_position(&blocks, 9), 0);
    }
}
