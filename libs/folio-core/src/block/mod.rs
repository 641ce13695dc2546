mod codec;

pub use codec::{list_position, BlockContent, LinkTarget, TodoItem, ToggleSection};

use super::{ordering::Sibling, utils, FolioError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    Todo,
    Toggle,
    Quote,
    Callout,
    Code,
    Divider,
    Image,
    Video,
    Link,
}

impl BlockType {
    pub const ALL: [BlockType; 15] = [
        BlockType::Text,
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::Heading3,
        BlockType::BulletList,
        BlockType::NumberedList,
        BlockType::Todo,
        BlockType::Toggle,
        BlockType::Quote,
        BlockType::Callout,
        BlockType::Code,
        BlockType::Divider,
        BlockType::Image,
        BlockType::Video,
        BlockType::Link,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading1 => "heading1",
            BlockType::Heading2 => "heading2",
            BlockType::Heading3 => "heading3",
            BlockType::BulletList => "bullet_list",
            BlockType::NumberedList => "numbered_list",
            BlockType::Todo => "todo",
            BlockType::Toggle => "toggle",
            BlockType::Quote => "quote",
            BlockType::Callout => "callout",
            BlockType::Code => "code",
            BlockType::Divider => "divider",
            BlockType::Image => "image",
            BlockType::Video => "video",
            BlockType::Link => "link",
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockType::Heading1 => Some(1),
            BlockType::Heading2 => Some(2),
            BlockType::Heading3 => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FolioError::Validation(format!("unknown block type: {s}")))
    }
}

/// Partial update sent to the store. A type change always resets the
/// content, so a patch carrying both writes `content` for the new type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<BlockType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl BlockPatch {
    pub fn content<S: Into<String>>(content: S) -> Self {
        Self {
            block_type: None,
            content: Some(content.into()),
        }
    }

    pub fn retype(block_type: BlockType) -> Self {
        Self {
            block_type: Some(block_type),
            content: Some(String::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.block_type.is_none() && self.content.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub page_id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    pub sort_order: i64,
    pub created: i64,
    pub updated: i64,
}

impl Block {
    pub fn new<P: AsRef<str>>(page_id: P, block_type: BlockType, sort_order: i64) -> Self {
        Self::with_id(utils::generate_id(), page_id, block_type, sort_order)
    }

    pub fn with_id<I, P>(id: I, page_id: P, block_type: BlockType, sort_order: i64) -> Self
    where
        I: Into<String>,
        P: AsRef<str>,
    {
        let now = utils::now_millis();
        Self {
            id: id.into(),
            page_id: page_id.as_ref().to_owned(),
            block_type,
            content: String::new(),
            sort_order,
            created: now,
            updated: now,
        }
    }

    pub fn with_content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    /// Changing the type drops the payload, the old encoding would be
    /// misread under the new type's codec rule.
    pub fn set_type(&mut self, block_type: BlockType) {
        self.block_type = block_type;
        self.content.clear();
        self.touch();
    }

    pub fn set_content<S: Into<String>>(&mut self, content: S) {
        self.content = content.into();
        self.touch();
    }

    pub fn apply(&mut self, patch: &BlockPatch) {
        if let Some(block_type) = patch.block_type {
            self.set_type(block_type);
        }
        if let Some(content) = &patch.content {
            self.set_content(content.clone());
        }
    }

    pub fn decode(&self) -> BlockContent {
        BlockContent::decode(self.block_type, &self.content)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn touch(&mut self) {
        self.updated = utils::now_millis();
    }
}

impl Sibling for Block {
    fn id(&self) -> &str {
        &self.id
    }

    fn order_key(&self) -> i64 {
        self.sort_order
    }

    fn set_order_key(&mut self, key: i64) {
        self.sort_order = key;
    }
}
