mod block;
mod document;
mod editor;
mod ordering;
mod page;
mod render;
mod types;
mod utils;

#[cfg(test)]
mod test_utils;

pub mod constants;

pub use block::{list_position, Block, BlockContent, BlockPatch, BlockType, LinkTarget, TodoItem, ToggleSection};
pub use document::{Document, DocumentKind, DocumentSettings};
pub use editor::{
    Caret, Debouncer, EditorConfig, EditorEngine, EditorKey, EditorSession, Effect, Flusher, Focus, Notification,
    PageNavigator, PendingKey, SlashCommand, SlashMenu, SLASH_COMMANDS,
};
pub use ordering::{Placement, Sibling};
pub use page::{validate_title, Page, PageNode, PageTree};
pub use render::{
    has_access, to_markdown, AllowlistSanitizer, DocumentRenderer, DocumentSummary, PublicPage, PublicView,
    PublicViewer, RenderedBlock, RenderedKind, RenderedPage, Sanitizer, TokenValidator,
};
pub use tracing::{debug, error, info, log::LevelFilter, trace, warn};
pub use types::{DocumentStore, FolioError, FolioResult};

pub mod order {
    //! Sibling ordering shared by page and block collections.
    pub use super::ordering::{
        apply_order, insert_after, insert_by_key, key_between, move_item, plan_insert_after, remove, renumber,
        sort_siblings,
    };
}
