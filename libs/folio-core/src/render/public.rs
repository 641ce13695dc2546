use super::{has_access, DocumentRenderer, RenderedBlock, RenderedPage, TokenValidator};
use crate::{
    info, Document, DocumentKind, DocumentStore, FolioError, FolioResult, Page, PageNode, PageTree,
};
use serde::Serialize;
use std::sync::Arc;

/// What a reader sees of a document before opening a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub kind: DocumentKind,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub price_cents: u64,
    pub product_id: Option<String>,
}

impl From<&Document> for DocumentSummary {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            kind: document.kind,
            title: document.title.clone(),
            description: document.description.clone(),
            cover_image: document.cover_image.clone(),
            price_cents: document.price_cents,
            product_id: document.product_id.clone(),
        }
    }
}

/// Without access the page nodes are marked locked and the caller shows a
/// purchase prompt; this is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicView {
    pub document: DocumentSummary,
    pub pages: Vec<PageNode>,
    pub has_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicPage {
    pub page: Page,
    pub blocks: Vec<RenderedBlock>,
}

impl From<PublicPage> for RenderedPage {
    fn from(public: PublicPage) -> Self {
        Self {
            id: public.page.id,
            title: public.page.title,
            blocks: public.blocks,
        }
    }
}

/// Read side of published documents, gated by price and purchase token.
pub struct PublicViewer<S, V> {
    store: Arc<S>,
    validator: Arc<V>,
    renderer: DocumentRenderer,
}

impl<S, V> PublicViewer<S, V>
where
    S: DocumentStore,
    V: TokenValidator,
{
    pub fn new(store: Arc<S>, validator: Arc<V>) -> Self {
        Self::with_renderer(store, validator, DocumentRenderer::default())
    }

    pub fn with_renderer(store: Arc<S>, validator: Arc<V>, renderer: DocumentRenderer) -> Self {
        Self {
            store,
            validator,
            renderer,
        }
    }

    pub fn renderer(&self) -> &DocumentRenderer {
        &self.renderer
    }

    /// Unpublished documents do not exist for readers.
    async fn published(&self, document_id: &str) -> FolioResult<Document> {
        let document = self.store.get_document(document_id).await?;
        if !document.published {
            return Err(FolioError::DocumentNotFound(document_id.to_owned()));
        }
        Ok(document)
    }

    pub async fn view(&self, document_id: &str, token: Option<&str>) -> FolioResult<PublicView> {
        let document = self.published(document_id).await?;
        let has_access = has_access(&document, token, self.validator.as_ref()).await?;

        let pages = self.store.list_pages(document_id).await?;
        let tree = PageTree::from_pages(document_id, pages);

        Ok(PublicView {
            document: DocumentSummary::from(&document),
            pages: tree.skeleton(!has_access),
            has_access,
        })
    }

    pub async fn page(&self, document_id: &str, page_id: &str, token: Option<&str>) -> FolioResult<PublicPage> {
        let document = self.published(document_id).await?;
        if !has_access(&document, token, self.validator.as_ref()).await? {
            info!("refusing page {page_id} of document {document_id} without access");
            return Err(FolioError::AccessDenied(document_id.to_owned()));
        }

        let page = self.store.get_page(page_id).await?;
        if page.document_id != document.id {
            return Err(FolioError::PageNotFound(page_id.to_owned()));
        }
        let blocks = self.store.list_blocks(page_id).await?;

        Ok(PublicPage {
            blocks: self.renderer.render_blocks(&blocks),
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::MockStore, BlockType, DocumentSettings, RenderedKind};
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl TokenValidator for Fixed {
        async fn validate(&self, _document_id: &str, token: &str) -> FolioResult<bool> {
            Ok(token == "paid")
        }
    }

    async fn published(price_cents: u64) -> (Arc<MockStore>, PublicViewer<MockStore, Fixed>, Page) {
        let store = Arc::new(MockStore::new());
        let page = store.seed_page(&[(BlockType::Text, "secret chapter")]);
        store
            .update_document(
                &page.document_id,
                DocumentSettings {
                    price_cents: Some(price_cents),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store.set_published(&page.document_id, true).await.unwrap();
        let viewer = PublicViewer::new(store.clone(), Arc::new(Fixed));
        (store, viewer, page)
    }

    #[tokio::test]
    async fn free_documents_are_open() {
        let (_, viewer, page) = published(0).await;

        let view = viewer.view(&page.document_id, None).await.unwrap();
        assert!(view.has_access);
        assert!(!view.pages[0].locked);

        let public = viewer.page(&page.document_id, &page.id, Some("junk")).await.unwrap();
        assert_eq!(
            public.blocks[0].kind,
            RenderedKind::Text {
                html: "secret chapter".into()
            }
        );
    }

    #[tokio::test]
    async fn paid_documents_are_locked_without_token() {
        let (_, viewer, page) = published(2_500).await;

        let view = viewer.view(&page.document_id, Some("wrong")).await.unwrap();
        assert!(!view.has_access);
        assert_eq!(view.document.price_cents, 2_500);
        assert_eq!(view.pages.len(), 1);
        assert!(view.pages[0].locked);

        for token in [None, Some("wrong")] {
            assert_eq!(
                viewer.page(&page.document_id, &page.id, token).await,
                Err(FolioError::AccessDenied(page.document_id.clone()))
            );
        }

        let public = viewer.page(&page.document_id, &page.id, Some("paid")).await.unwrap();
        assert_eq!(public.page.id, page.id);
        assert_eq!(public.blocks.len(), 1);
    }

    #[tokio::test]
    async fn unpublished_documents_are_hidden() {
        let (store, viewer, page) = published(0).await;
        store.set_published(&page.document_id, false).await.unwrap();

        assert!(matches!(
            viewer.view(&page.document_id, None).await,
            Err(FolioError::DocumentNotFound(_))
        ));
        assert!(matches!(
            viewer.page(&page.document_id, &page.id, None).await,
            Err(FolioError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn pages_of_other_documents_are_not_found() {
        let (store, viewer, page) = published(0).await;
        let other = store.seed_page(&[]);

        assert!(matches!(
            viewer.page(&page.document_id, &other.id, None).await,
            Err(FolioError::PageNotFound(_))
        ));
    }
}
