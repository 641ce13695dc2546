use super::*;
use crate::ordering::{self, key_between};
use tracing::{info, warn};

/// Page hierarchy of one document.
///
/// Parent links are acyclic: pages are only created under existing pages,
/// and `move_page` refuses a parent that lies inside the moved subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTree {
    document_id: String,
    pages: Vec<Page>,
}

/// Navigation skeleton: titles and nesting, never block content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNode {
    pub id: String,
    pub title: String,
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PageNode>,
}

impl PageTree {
    pub fn new<S: AsRef<str>>(document_id: S) -> Self {
        Self {
            document_id: document_id.as_ref().to_owned(),
            pages: Vec::new(),
        }
    }

    /// Build a tree from stored rows. Rows of other documents are dropped,
    /// dangling parents and parent cycles are promoted to roots, and sibling
    /// sets with colliding keys are renumbered.
    pub fn from_pages<S: AsRef<str>>(document_id: S, pages: Vec<Page>) -> Self {
        let mut tree = Self::new(document_id);

        for page in pages {
            if page.document_id != tree.document_id {
                warn!("page {} belongs to document {}, skipped", page.id, page.document_id);
                continue;
            }
            if tree.contains(&page.id) {
                warn!("duplicate page {}, skipped", page.id);
                continue;
            }
            tree.pages.push(page);
        }

        let ids = tree.pages.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        for id in &ids {
            let dangling = match tree.get(id).and_then(|p| p.parent_id.as_deref()) {
                Some(parent) => !tree.contains(parent),
                None => false,
            };
            if dangling || tree.is_ancestor(id, id) {
                warn!("page {id} has an unreachable parent, promoted to root");
                if let Some(page) = tree.get_mut(id) {
                    page.parent_id = None;
                }
            }
        }

        tree.repair_keys();
        tree
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn get(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    fn get_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == page_id)
    }

    pub fn contains(&self, page_id: &str) -> bool {
        self.get(page_id).is_some()
    }

    fn require(&self, page_id: &str) -> FolioResult<&Page> {
        self.get(page_id)
            .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))
    }

    fn siblings(&self, parent: Option<&str>) -> Vec<&Page> {
        let mut siblings = self
            .pages
            .iter()
            .filter(|p| p.parent_id.as_deref() == parent)
            .collect::<Vec<_>>();
        siblings.sort_by_key(|p| p.sort_order);
        siblings
    }

    fn sibling_ids(&self, parent: Option<&str>) -> Vec<String> {
        self.siblings(parent).into_iter().map(|p| p.id.clone()).collect()
    }

    pub fn roots(&self) -> Vec<&Page> {
        self.siblings(None)
    }

    pub fn children(&self, page_id: &str) -> Vec<&Page> {
        self.siblings(Some(page_id))
    }

    /// Whether `ancestor` lies on the parent chain above `page_id`.
    pub fn is_ancestor(&self, ancestor: &str, page_id: &str) -> bool {
        let mut current = self.get(page_id).and_then(|p| p.parent_id.as_deref());
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.pages.len() {
                break;
            }
            current = self.get(id).and_then(|p| p.parent_id.as_deref());
        }
        false
    }

    fn renumber_siblings(&mut self, parent: Option<&str>) {
        for (index, id) in self.sibling_ids(parent).iter().enumerate() {
            if let Some(page) = self.get_mut(id) {
                page.sort_order = index as i64;
            }
        }
    }

    fn repair_keys(&mut self) {
        let mut parents = self.pages.iter().map(|p| p.parent_id.clone()).collect::<Vec<_>>();
        parents.sort();
        parents.dedup();

        for parent in parents {
            let colliding = self
                .siblings(parent.as_deref())
                .windows(2)
                .any(|pair| pair[0].sort_order == pair[1].sort_order);
            if colliding {
                warn!("sibling keys under {parent:?} collide, renumbering");
                self.renumber_siblings(parent.as_deref());
            }
        }
    }

    fn append_key(&mut self, parent: Option<&str>) -> i64 {
        let last = self.siblings(parent).last().map(|p| p.sort_order);
        match key_between(last, None) {
            Some(key) => key,
            None => {
                self.renumber_siblings(parent);
                self.siblings(parent).len() as i64
            }
        }
    }

    /// Append a placeholder-titled page as the last root, or the last child
    /// of `parent`.
    pub fn create(&mut self, parent: Option<&str>) -> FolioResult<Page> {
        if let Some(parent) = parent {
            self.require(parent)?;
        }

        let key = self.append_key(parent);
        let page = Page::new(&self.document_id, parent, key);
        info!("create page {} under {:?}", page.id, parent);
        self.pages.push(page.clone());

        Ok(page)
    }

    /// Adopt a page created elsewhere, keeping its key.
    pub fn insert(&mut self, page: Page) -> FolioResult {
        if page.document_id != self.document_id {
            return Err(FolioError::Validation(format!(
                "page {} belongs to document {}",
                page.id, page.document_id
            )));
        }
        if self.contains(&page.id) {
            return Err(FolioError::Validation(format!("page {} already exists", page.id)));
        }
        if let Some(parent) = page.parent_id.as_deref() {
            self.require(parent)?;
        }

        let parent = page.parent_id.clone();
        self.pages.push(page);
        self.repair_keys_for(parent.as_deref());
        Ok(())
    }

    fn repair_keys_for(&mut self, parent: Option<&str>) {
        let colliding = self
            .siblings(parent)
            .windows(2)
            .any(|pair| pair[0].sort_order == pair[1].sort_order);
        if colliding {
            self.renumber_siblings(parent);
        }
    }

    pub fn rename(&mut self, page_id: &str, title: &str) -> FolioResult {
        let title = validate_title(title)?;
        let page = self
            .get_mut(page_id)
            .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))?;
        page.set_title(&title)
    }

    /// Remove a page. Its children move up to the removed page's parent and
    /// are appended after the surviving siblings, keeping their order.
    pub fn delete(&mut self, page_id: &str) -> FolioResult<Page> {
        let index = self
            .pages
            .iter()
            .position(|p| p.id == page_id)
            .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))?;
        let removed = self.pages.remove(index);

        let new_parent = removed.parent_id.clone();
        for child in self.sibling_ids(Some(&removed.id)) {
            let key = self.append_key(new_parent.as_deref());
            if let Some(page) = self.get_mut(&child) {
                page.parent_id = new_parent.clone();
                page.sort_order = key;
            }
        }

        info!("delete page {}", removed.id);
        Ok(removed)
    }

    pub fn reorder_roots<S: AsRef<str>>(&mut self, ordered_ids: &[S]) -> FolioResult {
        self.reorder_children(None, ordered_ids)
    }

    /// Full-replace reorder of one sibling set. Rejected without any change
    /// unless `ordered_ids` is a permutation of the current siblings.
    pub fn reorder_children<S: AsRef<str>>(&mut self, parent: Option<&str>, ordered_ids: &[S]) -> FolioResult {
        if let Some(parent) = parent {
            self.require(parent)?;
        }

        let mut siblings = self.siblings(parent).into_iter().cloned().collect::<Vec<_>>();
        ordering::apply_order(&mut siblings, ordered_ids)?;

        for sibling in siblings {
            if let Some(page) = self.get_mut(&sibling.id) {
                page.sort_order = sibling.sort_order;
            }
        }
        Ok(())
    }

    /// Reparent a page, appending it to the new sibling set.
    pub fn move_page(&mut self, page_id: &str, new_parent: Option<&str>) -> FolioResult {
        let current = self.require(page_id)?.parent_id.clone();
        if current.as_deref() == new_parent {
            return Ok(());
        }

        if let Some(parent) = new_parent {
            self.require(parent)?;
            if parent == page_id || self.is_ancestor(page_id, parent) {
                return Err(FolioError::CyclicParent {
                    page: page_id.to_owned(),
                    parent: parent.to_owned(),
                });
            }
        }

        let key = self.append_key(new_parent);
        if let Some(page) = self.get_mut(page_id) {
            page.parent_id = new_parent.map(str::to_owned);
            page.sort_order = key;
        }
        Ok(())
    }

    pub fn skeleton(&self, locked: bool) -> Vec<PageNode> {
        self.roots()
            .into_iter()
            .map(|page| self.node(page, locked))
            .collect()
    }

    fn node(&self, page: &Page, locked: bool) -> PageNode {
        PageNode {
            id: page.id.clone(),
            title: page.title.clone(),
            locked,
            children: self
                .children(&page.id)
                .into_iter()
                .map(|child| self.node(child, locked))
                .collect(),
        }
    }
}
