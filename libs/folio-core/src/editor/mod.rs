mod debounce;
mod engine;
mod navigator;
mod session;
mod slash;

pub use debounce::{Debouncer, Flusher};
pub use engine::{Caret, EditorEngine, EditorKey, Effect, Focus};
pub use navigator::PageNavigator;
pub use session::{EditorSession, PendingKey};
pub use slash::{SlashCommand, SlashMenu, SLASH_COMMANDS};

use crate::{constants::editor::DEBOUNCE_MS, FolioError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// How long content and title edits are buffered before they are written.
    pub debounce: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEBOUNCE_MS),
        }
    }
}

/// A persistence call that failed. Local state is kept as is; the next
/// reload reconciles with the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub operation: &'static str,
    pub message: String,
}

impl Notification {
    pub fn new(operation: &'static str, error: &FolioError) -> Self {
        Self {
            operation,
            message: error.to_string(),
        }
    }
}
