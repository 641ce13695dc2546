use super::{page::validate_title, utils, FolioError, FolioResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    KnowledgeBase,
    BlogPost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub kind: DocumentKind,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    /// zero means free
    pub price_cents: u64,
    pub published: bool,
    pub product_id: Option<String>,
    pub created: i64,
    pub updated: i64,
}

/// Settings form. Absent fields are left untouched; an empty string clears
/// an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSettings {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub price_cents: Option<u64>,
    #[serde(default)]
    pub product_id: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

impl Document {
    pub fn new(kind: DocumentKind, title: &str) -> FolioResult<Self> {
        let now = utils::now_millis();
        Ok(Self {
            id: utils::generate_id(),
            kind,
            title: validate_title(title)?,
            description: None,
            cover_image: None,
            price_cents: 0,
            published: false,
            product_id: None,
            created: now,
            updated: now,
        })
    }

    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }

    /// Validate every field first so a rejected update leaves the document
    /// untouched.
    pub fn apply_settings(&mut self, settings: &DocumentSettings) -> FolioResult {
        let title = settings.title.as_deref().map(validate_title).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = &settings.description {
            self.description = optional(description);
        }
        if let Some(cover_image) = &settings.cover_image {
            self.cover_image = optional(cover_image);
        }
        if let Some(price_cents) = settings.price_cents {
            self.price_cents = price_cents;
        }
        if let Some(product_id) = &settings.product_id {
            self.product_id = optional(product_id);
        }
        self.updated = utils::now_millis();

        Ok(())
    }

    /// Publishing needs at least one page; unpublishing is always allowed.
    pub fn set_published(&mut self, published: bool, page_count: usize) -> FolioResult {
        if published && page_count == 0 {
            return Err(FolioError::Validation(format!(
                "document {} has no pages to publish",
                self.id
            )));
        }
        if self.published != published {
            self.published = published;
            self.updated = utils::now_millis();
        }
        Ok(())
    }
}
