use crate::{
    order::{apply_order, insert_by_key, sort_siblings},
    Block, BlockPatch, BlockType, Document, DocumentKind, DocumentSettings, DocumentStore, FolioError, FolioResult,
    Page, PageTree,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

#[derive(Default)]
struct MockState {
    documents: Vec<Document>,
    pages: Vec<Page>,
    blocks: Vec<Block>,
    calls: Vec<String>,
}

impl MockState {
    fn tree(&self, document_id: &str) -> PageTree {
        let pages = self
            .pages
            .iter()
            .filter(|p| p.document_id == document_id)
            .cloned()
            .collect();
        PageTree::from_pages(document_id, pages)
    }

    fn store_tree(&mut self, tree: PageTree) {
        self.pages.retain(|p| p.document_id != tree.document_id());
        self.pages.extend(tree.pages().iter().cloned());
    }

    fn page_blocks(&mut self, page_id: &str) -> Vec<Block> {
        let (mut ours, rest) = self.blocks.drain(..).partition::<Vec<_>, _>(|b| b.page_id == page_id);
        self.blocks = rest;
        sort_siblings(&mut ours);
        ours
    }
}

/// Recording in-memory store. Every call is logged before it runs; with
/// `set_failing(true)` every call fails after being logged.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<MockState>,
    failing: AtomicBool,
    slow_content: Mutex<Option<(String, Duration)>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page holding blocks `b0`, `b1`, ... with keys 0, 10, 20, ...
    pub fn seed_page(&self, blocks: &[(BlockType, &str)]) -> Page {
        let document = Document::new(DocumentKind::KnowledgeBase, "Seeded").unwrap();
        let page = Page::new(&document.id, None, 0);

        let mut state = self.state.lock();
        state.blocks.extend(blocks.iter().enumerate().map(|(i, (block_type, content))| {
            Block::with_id(format!("b{i}"), &page.id, *block_type, i as i64 * 10).with_content(*content)
        }));
        state.documents.push(document);
        state.pages.push(page.clone());

        page
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Writes of exactly `content` take `delay` before they apply.
    pub fn slow_down(&self, content: &str, delay: Duration) {
        *self.slow_content.lock() = Some((content.to_owned(), delay));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn block(&self, block_id: &str) -> Option<Block> {
        self.state.lock().blocks.iter().find(|b| b.id == block_id).cloned()
    }

    pub fn page(&self, page_id: &str) -> Option<Page> {
        self.state.lock().pages.iter().find(|p| p.id == page_id).cloned()
    }

    fn record(&self, call: String) -> FolioResult {
        self.state.lock().calls.push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FolioError::External("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MockStore {
    async fn create_document(&self, kind: DocumentKind, title: &str) -> FolioResult<Document> {
        self.record(format!("create_document {title}"))?;
        let document = Document::new(kind, title)?;
        self.state.lock().documents.push(document.clone());
        Ok(document)
    }

    async fn get_document(&self, document_id: &str) -> FolioResult<Document> {
        self.state
            .lock()
            .documents
            .iter()
            .find(|d| d.id == document_id)
            .cloned()
            .ok_or_else(|| FolioError::DocumentNotFound(document_id.to_owned()))
    }

    async fn update_document(&self, document_id: &str, settings: DocumentSettings) -> FolioResult<Document> {
        self.record(format!("update_document {document_id}"))?;
        let mut state = self.state.lock();
        let document = state
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| FolioError::DocumentNotFound(document_id.to_owned()))?;
        document.apply_settings(&settings)?;
        Ok(document.clone())
    }

    async fn set_published(&self, document_id: &str, published: bool) -> FolioResult<Document> {
        self.record(format!("set_published {document_id} {published}"))?;
        let mut state = self.state.lock();
        let page_count = state.pages.iter().filter(|p| p.document_id == document_id).count();
        let document = state
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| FolioError::DocumentNotFound(document_id.to_owned()))?;
        document.set_published(published, page_count)?;
        Ok(document.clone())
    }

    async fn list_pages(&self, document_id: &str) -> FolioResult<Vec<Page>> {
        Ok(self.state.lock().tree(document_id).pages().to_vec())
    }

    async fn get_page(&self, page_id: &str) -> FolioResult<Page> {
        self.page(page_id)
            .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))
    }

    async fn create_page(&self, document_id: &str, parent_id: Option<&str>) -> FolioResult<Page> {
        self.record(format!("create_page {}", parent_id.unwrap_or("-")))?;
        let mut state = self.state.lock();
        let mut tree = state.tree(document_id);
        let page = tree.create(parent_id)?;
        state.store_tree(tree);
        Ok(page)
    }

    async fn rename_page(&self, page_id: &str, title: &str) -> FolioResult<()> {
        self.record(format!("rename_page {title}"))?;
        let mut state = self.state.lock();
        let page = state
            .pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))?;
        page.set_title(title)
    }

    async fn delete_page(&self, page_id: &str) -> FolioResult<()> {
        self.record(format!("delete_page {page_id}"))?;
        let mut state = self.state.lock();
        let page = state
            .pages
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))?;
        let mut tree = state.tree(&page.document_id);
        tree.delete(page_id)?;
        state.store_tree(tree);
        state.blocks.retain(|b| b.page_id != page_id);
        Ok(())
    }

    async fn reorder_root_pages(&self, document_id: &str, ordered_page_ids: &[String]) -> FolioResult<()> {
        self.record(format!("reorder_root_pages {}", ordered_page_ids.len()))?;
        let mut state = self.state.lock();
        let mut tree = state.tree(document_id);
        tree.reorder_roots(ordered_page_ids)?;
        state.store_tree(tree);
        Ok(())
    }

    async fn list_blocks(&self, page_id: &str) -> FolioResult<Vec<Block>> {
        let state = self.state.lock();
        let mut blocks = state
            .blocks
            .iter()
            .filter(|b| b.page_id == page_id)
            .cloned()
            .collect::<Vec<_>>();
        sort_siblings(&mut blocks);
        Ok(blocks)
    }

    async fn create_block(&self, page_id: &str, block_type: BlockType, sort_position: i64) -> FolioResult<Block> {
        self.record(format!("create_block {block_type}@{sort_position}"))?;
        let block = Block::new(page_id, block_type, sort_position);
        let mut state = self.state.lock();
        let mut blocks = state.page_blocks(page_id);
        insert_by_key(&mut blocks, block.clone());
        state.blocks.extend(blocks);
        Ok(block)
    }

    async fn update_block(&self, block_id: &str, patch: BlockPatch) -> FolioResult<()> {
        let change = match (&patch.block_type, &patch.content) {
            (Some(block_type), _) => format!("type={block_type}"),
            (None, Some(content)) => format!("content={content}"),
            (None, None) => "noop".to_owned(),
        };
        self.record(format!("update_block {block_id} {change}"))?;
        let delay = match (&*self.slow_content.lock(), &patch.content) {
            (Some((slow, delay)), Some(content)) if slow == content => Some(*delay),
            _ => None,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock();
        let block = state
            .blocks
            .iter_mut()
            .find(|b| b.id == block_id)
            .ok_or_else(|| FolioError::BlockNotFound(block_id.to_owned()))?;
        block.apply(&patch);
        Ok(())
    }

    async fn delete_block(&self, block_id: &str) -> FolioResult<()> {
        self.record(format!("delete_block {block_id}"))?;
        let mut state = self.state.lock();
        let before = state.blocks.len();
        state.blocks.retain(|b| b.id != block_id);
        if state.blocks.len() == before {
            return Err(FolioError::BlockNotFound(block_id.to_owned()));
        }
        Ok(())
    }

    async fn reorder_blocks(&self, page_id: &str, ordered_block_ids: &[String]) -> FolioResult<()> {
        self.record(format!("reorder_blocks {}", ordered_block_ids.join(",")))?;
        let mut state = self.state.lock();
        let mut blocks = state.page_blocks(page_id);
        let result = apply_order(&mut blocks, ordered_block_ids);
        state.blocks.extend(blocks);
        result
    }
}
