use crate::constants::render::{ALLOWED_TAGS, LINK_SCHEMES};
use ammonia::{Builder, UrlRelative};
use std::collections::{HashMap, HashSet};

/// Turns user-authored text into markup that is safe to embed.
pub trait Sanitizer: Send + Sync {
    /// Keep allowlisted inline markup, strip everything else.
    fn sanitize(&self, input: &str) -> String;
    /// Treat the input as literal text.
    fn escape(&self, input: &str) -> String;
}

/// Allowlist sanitizer: inline emphasis, links and a few inline
/// containers. Disallowed tags are removed, `script` and `style` together
/// with their content.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowlistSanitizer;

impl AllowlistSanitizer {
    fn builder() -> Builder<'static> {
        let mut builder = Builder::empty();
        builder
            .tags(ALLOWED_TAGS.into_iter().collect())
            .clean_content_tags(HashSet::from(["script", "style"]))
            .tag_attributes(HashMap::from([("a", HashSet::from(["href", "title"]))]))
            .url_schemes(LINK_SCHEMES.into_iter().collect())
            .url_relative(UrlRelative::Deny)
            .link_rel(Some("noopener noreferrer nofollow"));
        builder
    }
}

impl Sanitizer for AllowlistSanitizer {
    fn sanitize(&self, input: &str) -> String {
        Self::builder().clean(input).to_string()
    }

    fn escape(&self, input: &str) -> String {
        ammonia::clean_text(input)
    }
}
