use crate::{constants::editor::SLASH, BlockType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashCommand {
    pub block_type: BlockType,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

impl SlashCommand {
    /// Case-insensitive match on label, type name or any keyword prefix.
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim().to_lowercase();
        if filter.is_empty() {
            return true;
        }

        self.label.to_lowercase().contains(&filter)
            || self.block_type.as_str().contains(&filter)
            || self.keywords.iter().any(|keyword| keyword.starts_with(&filter))
    }
}

pub const SLASH_COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        block_type: BlockType::Text,
        label: "Text",
        keywords: &["paragraph", "plain"],
    },
    SlashCommand {
        block_type: BlockType::Heading1,
        label: "Heading 1",
        keywords: &["h1", "title"],
    },
    SlashCommand {
        block_type: BlockType::Heading2,
        label: "Heading 2",
        keywords: &["h2", "subtitle"],
    },
    SlashCommand {
        block_type: BlockType::Heading3,
        label: "Heading 3",
        keywords: &["h3"],
    },
    SlashCommand {
        block_type: BlockType::BulletList,
        label: "Bulleted list",
        keywords: &["ul", "unordered"],
    },
    SlashCommand {
        block_type: BlockType::NumberedList,
        label: "Numbered list",
        keywords: &["ol", "ordered"],
    },
    SlashCommand {
        block_type: BlockType::Todo,
        label: "To-do list",
        keywords: &["todo", "checkbox", "task"],
    },
    SlashCommand {
        block_type: BlockType::Toggle,
        label: "Toggle",
        keywords: &["collapse", "details"],
    },
    SlashCommand {
        block_type: BlockType::Quote,
        label: "Quote",
        keywords: &["blockquote", "citation"],
    },
    SlashCommand {
        block_type: BlockType::Callout,
        label: "Callout",
        keywords: &["note", "tip", "warning"],
    },
    SlashCommand {
        block_type: BlockType::Code,
        label: "Code",
        keywords: &["snippet", "pre"],
    },
    SlashCommand {
        block_type: BlockType::Divider,
        label: "Divider",
        keywords: &["hr", "separator", "line"],
    },
    SlashCommand {
        block_type: BlockType::Image,
        label: "Image",
        keywords: &["picture", "photo"],
    },
    SlashCommand {
        block_type: BlockType::Video,
        label: "Video",
        keywords: &["movie", "embed"],
    },
    SlashCommand {
        block_type: BlockType::Link,
        label: "Link",
        keywords: &["url", "bookmark"],
    },
];

/// Block type picker state of the focused block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlashMenu {
    #[default]
    Idle,
    Open {
        filter: String,
        selected: usize,
    },
}

impl SlashMenu {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn filter(&self) -> Option<&str> {
        match self {
            Self::Open { filter, .. } => Some(filter),
            Self::Idle => None,
        }
    }

    pub fn candidates(&self) -> Vec<&'static SlashCommand> {
        match self {
            Self::Open { filter, .. } => SLASH_COMMANDS.iter().filter(|c| c.matches(filter)).collect(),
            Self::Idle => Vec::new(),
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        match self {
            Self::Open { selected, .. } => Some(*selected),
            Self::Idle => None,
        }
    }

    pub fn selected(&self) -> Option<&'static SlashCommand> {
        let index = self.selected_index()?;
        self.candidates().get(index).copied()
    }

    /// Feed the block's full content after an edit.
    pub fn on_input(&mut self, content: &str) {
        let next = match (&*self, content.strip_prefix(SLASH)) {
            (Self::Idle, Some("")) => Self::Open {
                filter: String::new(),
                selected: 0,
            },
            (Self::Idle, _) => return,
            (Self::Open { .. }, Some(rest)) => Self::Open {
                filter: rest.to_owned(),
                selected: 0,
            },
            (Self::Open { .. }, None) => Self::Idle,
        };
        *self = next;
    }

    /// Move the highlight, clamped to the candidate list.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.candidates().len();
        if let Self::Open { selected, .. } = self {
            *selected = match len {
                0 => 0,
                len => selected.saturating_add_signed(delta).min(len - 1),
            };
        }
    }

    pub fn dismiss(&mut self) {
        *self = Self::Idle;
    }
}
