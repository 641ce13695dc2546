/// Payload markers understood by the content codec.
pub mod codec {
    /// `[x] `
    pub const TODO_CHECKED: &str = "[x] ";

    /// `[ ] `
    pub const TODO_UNCHECKED: &str = "[ ] ";

    /// Separator line between a toggle's title and body.
    pub const TOGGLE_SENTINEL: &str = "\n---\n";

    /// Separator between a link's url and its label.
    pub const LINK_SEPARATOR: char = '|';
}

pub mod page {
    /// Title given to freshly created pages.
    pub const PLACEHOLDER_TITLE: &str = "Untitled";
}

pub mod editor {
    /// Debounce window for content and title writes.
    pub const DEBOUNCE_MS: u64 = 500;

    /// Opens the block type picker when typed into an empty block.
    pub const SLASH: char = '/';
}

pub mod render {
    /// Schemes accepted for image and video sources.
    pub const MEDIA_SCHEMES: [&str; 2] = ["http", "https"];

    /// Schemes accepted for links, both link blocks and inline anchors.
    pub const LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

    /// Inline markup that survives sanitization.
    pub const ALLOWED_TAGS: [&str; 13] = [
        "a", "b", "strong", "i", "em", "u", "s", "del", "code", "mark", "span", "sub", "sup",
    ];
}
