use crate::{info, validate_title, DocumentStore, FolioError, FolioResult, Page, PageNode, PageTree};
use std::sync::Arc;

/// Sidebar controller: a local page tree kept in step with the store. Input
/// is validated against the local tree before any store call, and the tree
/// only changes after the store accepted the change.
pub struct PageNavigator<S: DocumentStore> {
    store: Arc<S>,
    tree: PageTree,
}

impl<S: DocumentStore> PageNavigator<S> {
    pub async fn load(store: Arc<S>, document_id: &str) -> FolioResult<Self> {
        store.get_document(document_id).await?;
        let pages = store.list_pages(document_id).await?;
        Ok(Self {
            store,
            tree: PageTree::from_pages(document_id, pages),
        })
    }

    pub fn tree(&self) -> &PageTree {
        &self.tree
    }

    pub fn skeleton(&self) -> Vec<PageNode> {
        self.tree.skeleton(false)
    }

    pub async fn reload(&mut self) -> FolioResult {
        let pages = self.store.list_pages(self.tree.document_id()).await?;
        self.tree = PageTree::from_pages(self.tree.document_id(), pages);
        Ok(())
    }

    fn require(&self, page_id: &str) -> FolioResult {
        match self.tree.contains(page_id) {
            true => Ok(()),
            false => Err(FolioError::PageNotFound(page_id.to_owned())),
        }
    }

    pub async fn create_page(&mut self, parent_id: Option<&str>) -> FolioResult<Page> {
        if let Some(parent_id) = parent_id {
            self.require(parent_id)?;
        }

        let page = self.store.create_page(self.tree.document_id(), parent_id).await?;
        self.tree.insert(page.clone())?;
        Ok(page)
    }

    pub async fn rename_page(&mut self, page_id: &str, title: &str) -> FolioResult {
        let title = validate_title(title)?;
        self.require(page_id)?;

        self.store.rename_page(page_id, &title).await?;
        self.tree.rename(page_id, &title)
    }

    pub async fn delete_page(&mut self, page_id: &str) -> FolioResult<Page> {
        self.require(page_id)?;

        self.store.delete_page(page_id).await?;
        let removed = self.tree.delete(page_id)?;
        info!("page {} removed from navigation", removed.id);
        Ok(removed)
    }

    /// Full-replace reorder of the root pages.
    pub async fn reorder_roots(&mut self, ordered_ids: &[String]) -> FolioResult {
        let mut reordered = self.tree.clone();
        reordered.reorder_roots(ordered_ids)?;

        self.store
            .reorder_root_pages(self.tree.document_id(), ordered_ids)
            .await?;
        self.tree = reordered;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockStore;

    async fn navigator() -> (Arc<MockStore>, PageNavigator<MockStore>) {
        let store = Arc::new(MockStore::new());
        let page = store.seed_page(&[]);
        let navigator = PageNavigator::load(store.clone(), &page.document_id).await.unwrap();
        (store, navigator)
    }

    #[tokio::test]
    async fn keeps_tree_in_step() {
        let (store, mut navigator) = navigator().await;
        let seeded = navigator.tree().roots()[0].id.clone();

        let child = navigator.create_page(Some(&seeded)).await.unwrap();
        let second = navigator.create_page(None).await.unwrap();
        navigator.rename_page(&child.id, " Setup ").await.unwrap();

        assert_eq!(store.page(&child.id).unwrap().title, "Setup");
        let skeleton = navigator.skeleton();
        assert_eq!(skeleton.len(), 2);
        assert_eq!(skeleton[0].children[0].title, "Setup");

        navigator
            .reorder_roots(&[second.id.clone(), seeded.clone()])
            .await
            .unwrap();
        assert_eq!(navigator.tree().roots()[0].id, second.id);

        navigator.delete_page(&seeded).await.unwrap();
        let roots = navigator.tree().roots().iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(roots, [second.id.clone(), child.id.clone()]);

        navigator.reload().await.unwrap();
        let reloaded = navigator.tree().roots().iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(reloaded, roots);
    }

    #[tokio::test]
    async fn validates_before_calling_store() {
        let (store, mut navigator) = navigator().await;
        let seeded = navigator.tree().roots()[0].id.clone();

        assert!(matches!(
            navigator.rename_page(&seeded, "   ").await,
            Err(FolioError::Validation(_))
        ));
        assert!(matches!(
            navigator.create_page(Some("ghost")).await,
            Err(FolioError::PageNotFound(_))
        ));
        assert!(matches!(
            navigator.reorder_roots(&[seeded.clone(), seeded.clone()]).await,
            Err(FolioError::OrderMismatch(_))
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn store_failure_leaves_tree_alone() {
        let (store, mut navigator) = navigator().await;
        let before = navigator.tree().clone();
        store.set_failing(true);

        assert!(navigator.create_page(None).await.is_err());
        let seeded = before.roots()[0].id.clone();
        assert!(navigator.rename_page(&seeded, "New").await.is_err());
        assert_eq!(navigator.tree(), &before);
    }
}
