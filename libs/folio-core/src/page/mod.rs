mod tree;

pub use tree::{PageNode, PageTree};

use super::{constants, ordering::Sibling, utils, FolioError, FolioResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub document_id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub sort_order: i64,
    pub created: i64,
    pub updated: i64,
}

impl Page {
    pub fn new<D: AsRef<str>>(document_id: D, parent_id: Option<&str>, sort_order: i64) -> Self {
        let now = utils::now_millis();
        Self {
            id: utils::generate_id(),
            document_id: document_id.as_ref().to_owned(),
            title: constants::page::PLACEHOLDER_TITLE.to_owned(),
            parent_id: parent_id.map(str::to_owned),
            sort_order,
            created: now,
            updated: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn set_title(&mut self, title: &str) -> FolioResult {
        self.title = validate_title(title)?;
        self.updated = utils::now_millis();
        Ok(())
    }
}

impl Sibling for Page {
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

/// Trimmed title, rejected when nothing is left.
pub fn validate_title(title: &str) -> FolioResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FolioError::Validation("title must not be empty".into()));
    }
    Ok(title.to_owned())
}
