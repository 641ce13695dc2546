use super::*;
use crate::{Block, BlockPatch, BlockType, Document, DocumentKind, DocumentSettings, Page};
use async_trait::async_trait;

/// Key-addressed persistence collaborator behind the editor and the public
/// viewer. Every reorder call carries the complete id sequence of the
/// sibling set; partial orderings are never sent.
#[async_trait]
pub trait DocumentStore<E = FolioError>: Send + Sync {
    /// create an empty document owned by the caller
    async fn create_document(&self, kind: DocumentKind, title: &str) -> FolioResult<Document, E>;
    /// get a document by id
    async fn get_document(&self, document_id: &str) -> FolioResult<Document, E>;
    /// apply a settings update, all fields validated before any is written
    async fn update_document(&self, document_id: &str, settings: DocumentSettings) -> FolioResult<Document, E>;
    /// toggle publication, publishing requires at least one page
    async fn set_published(&self, document_id: &str, published: bool) -> FolioResult<Document, E>;

    /// every page of a document, in no particular order
    async fn list_pages(&self, document_id: &str) -> FolioResult<Vec<Page>, E>;
    /// get a page by id
    async fn get_page(&self, page_id: &str) -> FolioResult<Page, E>;
    /// append a page as the last root or the last child of `parent_id`
    async fn create_page(&self, document_id: &str, parent_id: Option<&str>) -> FolioResult<Page, E>;
    async fn rename_page(&self, page_id: &str, title: &str) -> FolioResult<(), E>;
    /// remove a page together with its blocks
    async fn delete_page(&self, page_id: &str) -> FolioResult<(), E>;
    /// replace the order of root pages with a full permutation of their ids
    async fn reorder_root_pages(&self, document_id: &str, ordered_page_ids: &[String]) -> FolioResult<(), E>;

    /// blocks of a page ordered by their sort key
    async fn list_blocks(&self, page_id: &str) -> FolioResult<Vec<Block>, E>;
    async fn create_block(&self, page_id: &str, block_type: BlockType, sort_position: i64) -> FolioResult<Block, E>;
    async fn update_block(&self, block_id: &str, patch: BlockPatch) -> FolioResult<(), E>;
    async fn delete_block(&self, block_id: &str) -> FolioResult<(), E>;
    /// replace the order of a page's blocks with a full permutation of their ids
    async fn reorder_blocks(&self, page_id: &str, ordered_block_ids: &[String]) -> FolioResult<(), E>;
}
