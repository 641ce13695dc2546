use super::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::RwLock};

const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Grant {
    document_id: String,
    issued: DateTime<Utc>,
}

/// Everything the storage holds; also the on-disk snapshot format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    documents: HashMap<String, Document>,
    pages: HashMap<String, Page>,
    blocks: HashMap<String, Block>,
    #[serde(default)]
    grants: HashMap<String, Grant>,
}

impl Snapshot {
    fn document(&self, document_id: &str) -> FolioResult<&Document> {
        self.documents
            .get(document_id)
            .ok_or_else(|| FolioError::DocumentNotFound(document_id.to_owned()))
    }

    fn document_mut(&mut self, document_id: &str) -> FolioResult<&mut Document> {
        self.documents
            .get_mut(document_id)
            .ok_or_else(|| FolioError::DocumentNotFound(document_id.to_owned()))
    }

    fn page(&self, page_id: &str) -> FolioResult<&Page> {
        self.pages
            .get(page_id)
            .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))
    }

    fn tree(&self, document_id: &str) -> PageTree {
        let pages = self
            .pages
            .values()
            .filter(|p| p.document_id == document_id)
            .cloned()
            .collect();
        PageTree::from_pages(document_id, pages)
    }

    fn store_tree(&mut self, tree: PageTree) {
        self.pages.retain(|_, p| p.document_id != tree.document_id());
        self.pages
            .extend(tree.pages().iter().map(|p| (p.id.clone(), p.clone())));
    }

    fn page_blocks(&self, page_id: &str) -> Vec<Block> {
        let mut blocks = self
            .blocks
            .values()
            .filter(|b| b.page_id == page_id)
            .cloned()
            .collect::<Vec<_>>();
        sort_siblings(&mut blocks);
        blocks
    }

    fn store_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks
            .extend(blocks.into_iter().map(|b| (b.id.clone(), b)));
    }
}

/// In-memory `DocumentStore`. When opened on a path every mutation is
/// written back as a JSON snapshot before the call returns.
#[derive(Debug, Default)]
pub struct FolioStorage {
    state: RwLock<Snapshot>,
    path: Option<PathBuf>,
}

impl FolioStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the snapshot at `path`, starting empty when the file does not
    /// exist yet.
    pub async fn open<P: AsRef<Path>>(path: P) -> FolioStorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let state = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(err) => return Err(err.into()),
        };
        info!(
            "opened storage at {} with {} documents",
            path.display(),
            state.documents.len()
        );

        Ok(Self {
            state: RwLock::new(state),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, state: &Snapshot) -> FolioStorageResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let temp = path.with_extension("tmp");
        fs::write(&temp, serde_json::to_vec_pretty(state)?).await?;
        fs::rename(&temp, path).await?;
        debug!("snapshot written to {}", path.display());
        Ok(())
    }

    /// Run a mutation under the write lock and persist the result. The
    /// closure must check everything before it changes anything.
    async fn mutate<T, F>(&self, f: F) -> FolioStorageResult<T>
    where
        F: FnOnce(&mut Snapshot) -> FolioResult<T>,
    {
        let mut state = self.state.write().await;
        let value = f(&mut state)?;
        if let Err(err) = self.persist(&state).await {
            warn!("failed to persist snapshot: {err}");
            return Err(err);
        }
        Ok(value)
    }

    async fn read<T, F>(&self, f: F) -> FolioResult<T>
    where
        F: FnOnce(&Snapshot) -> FolioResult<T>,
    {
        f(&*self.state.read().await)
    }

    /// Issue an opaque purchase token for a document.
    pub async fn grant_access(&self, document_id: &str) -> FolioStorageResult<String> {
        self.mutate(|state| {
            state.document(document_id)?;
            let token = nanoid!(TOKEN_LENGTH);
            state.grants.insert(
                token.clone(),
                Grant {
                    document_id: document_id.to_owned(),
                    issued: Utc::now(),
                },
            );
            info!("granted access to document {document_id}");
            Ok(token)
        })
        .await
    }

    /// Withdraw a token; false when it was never issued.
    pub async fn revoke_access(&self, token: &str) -> FolioStorageResult<bool> {
        self.mutate(|state| Ok(state.grants.remove(token).is_some()))
            .await
    }
}

#[async_trait]
impl TokenValidator for FolioStorage {
    async fn validate(&self, document_id: &str, token: &str) -> FolioResult<bool> {
        self.read(|state| {
            Ok(state
                .grants
                .get(token)
                .map_or(false, |grant| grant.document_id == document_id))
        })
        .await
    }
}

#[async_trait]
impl DocumentStore for FolioStorage {
    async fn create_document(&self, kind: DocumentKind, title: &str) -> FolioResult<Document> {
        let document = Document::new(kind, title)?;
        Ok(self
            .mutate(|state| {
                info!("create document {}", document.id);
                state
                    .documents
                    .insert(document.id.clone(), document.clone());
                Ok(document)
            })
            .await?)
    }

    async fn get_document(&self, document_id: &str) -> FolioResult<Document> {
        self.read(|state| state.document(document_id).cloned())
            .await
    }

    async fn update_document(&self, document_id: &str, settings: DocumentSettings) -> FolioResult<Document> {
        Ok(self
            .mutate(|state| {
                let document = state.document_mut(document_id)?;
                document.apply_settings(&settings)?;
                Ok(document.clone())
            })
            .await?)
    }

    async fn set_published(&self, document_id: &str, published: bool) -> FolioResult<Document> {
        Ok(self
            .mutate(|state| {
                let page_count = state
                    .pages
                    .values()
                    .filter(|p| p.document_id == document_id)
                    .count();
                let document = state.document_mut(document_id)?;
                document.set_published(published, page_count)?;
                info!("document {document_id} published: {published}");
                Ok(document.clone())
            })
            .await?)
    }

    async fn list_pages(&self, document_id: &str) -> FolioResult<Vec<Page>> {
        self.read(|state| {
            state.document(document_id)?;
            Ok(state.tree(document_id).pages().to_vec())
        })
        .await
    }

    async fn get_page(&self, page_id: &str) -> FolioResult<Page> {
        self.read(|state| state.page(page_id).cloned()).await
    }

    async fn create_page(&self, document_id: &str, parent_id: Option<&str>) -> FolioResult<Page> {
        Ok(self
            .mutate(|state| {
                state.document(document_id)?;
                let mut tree = state.tree(document_id);
                let page = tree.create(parent_id)?;
                state.store_tree(tree);
                Ok(page)
            })
            .await?)
    }

    async fn rename_page(&self, page_id: &str, title: &str) -> FolioResult<()> {
        Ok(self
            .mutate(|state| {
                state
                    .pages
                    .get_mut(page_id)
                    .ok_or_else(|| FolioError::PageNotFound(page_id.to_owned()))?
                    .set_title(title)
            })
            .await?)
    }

    async fn delete_page(&self, page_id: &str) -> FolioResult<()> {
        Ok(self
            .mutate(|state| {
                let document_id = state.page(page_id)?.document_id.clone();
                let mut tree = state.tree(&document_id);
                tree.delete(page_id)?;
                state.store_tree(tree);

                let before = state.blocks.len();
                state.blocks.retain(|_, b| b.page_id != page_id);
                debug!(
                    "dropped {} blocks of page {page_id}",
                    before - state.blocks.len()
                );
                Ok(())
            })
            .await?)
    }

    async fn reorder_root_pages(&self, document_id: &str, ordered_page_ids: &[String]) -> FolioResult<()> {
        Ok(self
            .mutate(|state| {
                state.document(document_id)?;
                let mut tree = state.tree(document_id);
                tree.reorder_roots(ordered_page_ids)?;
                state.store_tree(tree);
                Ok(())
            })
            .await?)
    }

    async fn list_blocks(&self, page_id: &str) -> FolioResult<Vec<Block>> {
        self.read(|state| {
            state.page(page_id)?;
            Ok(state.page_blocks(page_id))
        })
        .await
    }

    async fn create_block(&self, page_id: &str, block_type: BlockType, sort_position: i64) -> FolioResult<Block> {
        Ok(self
            .mutate(|state| {
                state.page(page_id)?;
                let mut blocks = state.page_blocks(page_id);
                let index = insert_by_key(&mut blocks, Block::new(page_id, block_type, sort_position));
                let block = blocks[index].clone();
                state.store_blocks(blocks);
                info!("create {block_type} block {} at {sort_position}", block.id);
                Ok(block)
            })
            .await?)
    }

    async fn update_block(&self, block_id: &str, patch: BlockPatch) -> FolioResult<()> {
        Ok(self
            .mutate(|state| {
                state
                    .blocks
                    .get_mut(block_id)
                    .ok_or_else(|| FolioError::BlockNotFound(block_id.to_owned()))?
                    .apply(&patch);
                Ok(())
            })
            .await?)
    }

    async fn delete_block(&self, block_id: &str) -> FolioResult<()> {
        Ok(self
            .mutate(|state| {
                state
                    .blocks
                    .remove(block_id)
                    .ok_or_else(|| FolioError::BlockNotFound(block_id.to_owned()))?;
                Ok(())
            })
            .await?)
    }

    async fn reorder_blocks(&self, page_id: &str, ordered_block_ids: &[String]) -> FolioResult<()> {
        Ok(self
            .mutate(|state| {
                state.page(page_id)?;
                let mut blocks = state.page_blocks(page_id);
                apply_order(&mut blocks, ordered_block_ids)?;
                state.store_blocks(blocks);
                Ok(())
            })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    async fn document_with_page(storage: &FolioStorage) -> (Document, Page) {
        let document = storage
            .create_document(DocumentKind::KnowledgeBase, "Handbook")
            .await
            .unwrap();
        let page = storage.create_page(&document.id, None).await.unwrap();
        (document, page)
    }

    fn ids(blocks: &[Block]) -> Vec<String> {
        blocks.iter().map(|b| b.id.clone()).collect()
    }

    #[tokio::test]
    async fn documents_and_pages() {
        let storage = FolioStorage::new();
        let (document, root) = document_with_page(&storage).await;
        let child = storage
            .create_page(&document.id, Some(&root.id))
            .await
            .unwrap();
        let second = storage.create_page(&document.id, None).await.unwrap();

        storage.rename_page(&child.id, "  Setup ").await.unwrap();
        assert_eq!(storage.get_page(&child.id).await.unwrap().title, "Setup");
        assert_eq!(storage.list_pages(&document.id).await.unwrap().len(), 3);

        storage
            .reorder_root_pages(&document.id, &[second.id.clone(), root.id.clone()])
            .await
            .unwrap();
        let tree = PageTree::from_pages(&document.id, storage.list_pages(&document.id).await.unwrap());
        assert_eq!(
            tree.roots().iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            [second.id.as_str(), root.id.as_str()]
        );

        assert!(matches!(
            storage.reorder_root_pages(&document.id, &[root.id.clone()]).await,
            Err(FolioError::OrderMismatch(_))
        ));
        assert!(matches!(
            storage.create_page("missing", None).await,
            Err(FolioError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_a_page_drops_its_blocks_and_lifts_children() {
        let storage = FolioStorage::new();
        let (document, root) = document_with_page(&storage).await;
        let child = storage
            .create_page(&document.id, Some(&root.id))
            .await
            .unwrap();
        let block = storage
            .create_block(&root.id, BlockType::Text, 0)
            .await
            .unwrap();

        storage.delete_page(&root.id).await.unwrap();

        assert!(storage.get_page(&root.id).await.unwrap_err().is_not_found());
        assert_eq!(storage.get_page(&child.id).await.unwrap().parent_id, None);
        assert!(matches!(
            storage.delete_block(&block.id).await,
            Err(FolioError::BlockNotFound(_))
        ));
    }

    #[tokio::test]
    async fn publishing_needs_pages() {
        let storage = FolioStorage::new();
        let document = storage
            .create_document(DocumentKind::BlogPost, "Post")
            .await
            .unwrap();

        assert!(matches!(
            storage.set_published(&document.id, true).await,
            Err(FolioError::Validation(_))
        ));
        storage.create_page(&document.id, None).await.unwrap();
        assert!(storage.set_published(&document.id, true).await.unwrap().published);
    }

    #[tokio::test]
    async fn block_crud() {
        let storage = FolioStorage::new();
        let (_, page) = document_with_page(&storage).await;

        let a = storage.create_block(&page.id, BlockType::Text, 0).await.unwrap();
        let b = storage.create_block(&page.id, BlockType::Todo, 10).await.unwrap();
        storage
            .update_block(&b.id, BlockPatch::content("[x] ship"))
            .await
            .unwrap();
        storage
            .update_block(&a.id, BlockPatch::retype(BlockType::Heading2))
            .await
            .unwrap();

        let blocks = storage.list_blocks(&page.id).await.unwrap();
        assert_eq!(ids(&blocks), [a.id.clone(), b.id.clone()]);
        assert_eq!(blocks[0].block_type, BlockType::Heading2);
        assert_eq!(blocks[1].content, "[x] ship");

        storage
            .reorder_blocks(&page.id, &[b.id.clone(), a.id.clone()])
            .await
            .unwrap();
        assert_eq!(ids(&storage.list_blocks(&page.id).await.unwrap()), [b.id.clone(), a.id.clone()]);

        storage.delete_block(&a.id).await.unwrap();
        assert_eq!(ids(&storage.list_blocks(&page.id).await.unwrap()), [b.id]);
        assert!(storage.list_blocks("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn random_inserts_keep_keys_strictly_increasing() {
        let storage = FolioStorage::new();
        let (_, page) = document_with_page(&storage).await;
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let blocks = storage.list_blocks(&page.id).await.unwrap();
            let position = match blocks.len() {
                0 => 0,
                len => blocks[rng.gen_range(0..len)].sort_order + rng.gen_range(-1..=1),
            };
            let created = storage
                .create_block(&page.id, BlockType::Text, position)
                .await
                .unwrap();

            let blocks = storage.list_blocks(&page.id).await.unwrap();
            assert!(blocks.iter().any(|b| b.id == created.id));
            assert!(blocks.windows(2).all(|w| w[0].sort_order < w[1].sort_order));
        }

        let mut order = ids(&storage.list_blocks(&page.id).await.unwrap());
        order.reverse();
        storage.reorder_blocks(&page.id, &order).await.unwrap();
        assert_eq!(ids(&storage.list_blocks(&page.id).await.unwrap()), order);
    }

    #[tokio::test]
    async fn grants_are_scoped_to_their_document() {
        let storage = FolioStorage::new();
        let (document, _) = document_with_page(&storage).await;
        let (other, _) = document_with_page(&storage).await;

        let token = storage.grant_access(&document.id).await.unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(storage.validate(&document.id, &token).await.unwrap());
        assert!(!storage.validate(&other.id, &token).await.unwrap());
        assert!(!storage.validate(&document.id, "forged").await.unwrap());

        assert!(storage.revoke_access(&token).await.unwrap());
        assert!(!storage.validate(&document.id, &token).await.unwrap());
        assert!(matches!(
            storage.grant_access("missing").await,
            Err(FolioStorageError::Core(FolioError::DocumentNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn snapshots_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("folio.json");

        let (document, page, token) = {
            let storage = FolioStorage::open(&path).await.unwrap();
            let (document, page) = document_with_page(&storage).await;
            storage
                .create_block(&page.id, BlockType::Quote, 0)
                .await
                .unwrap();
            let token = storage.grant_access(&document.id).await.unwrap();
            (document, page, token)
        };

        let storage = FolioStorage::open(&path).await.unwrap();
        assert_eq!(storage.path(), Some(path.as_path()));
        assert_eq!(storage.get_document(&document.id).await.unwrap(), document);
        assert_eq!(storage.list_pages(&document.id).await.unwrap(), [page.clone()]);
        assert_eq!(storage.list_blocks(&page.id).await.unwrap()[0].block_type, BlockType::Quote);
        assert!(storage.validate(&document.id, &token).await.unwrap());
    }

    #[tokio::test]
    async fn corrupt_snapshots_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        assert!(matches!(
            FolioStorage::open(&path).await,
            Err(FolioStorageError::Serde(_))
        ));
    }
}
