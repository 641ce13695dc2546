use crate::{Document, FolioError, FolioResult};
use async_trait::async_trait;

/// Checks purchase tokens presented by readers of paid documents.
#[async_trait]
pub trait TokenValidator<E = FolioError>: Send + Sync {
    async fn validate(&self, document_id: &str, token: &str) -> FolioResult<bool, E>;
}

/// Free documents are open to everyone; paid ones need a token the
/// validator accepts for this document.
pub async fn has_access<V: TokenValidator + ?Sized>(
    document: &Document,
    token: Option<&str>,
    validator: &V,
) -> FolioResult<bool> {
    if document.is_free() {
        return Ok(true);
    }
    match token.map(str::trim).filter(|token| !token.is_empty()) {
        Some(token) => validator.validate(&document.id, token).await,
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentKind;

    struct Fixed(&'static str);

    #[async_trait]
    impl TokenValidator for Fixed {
        async fn validate(&self, _document_id: &str, token: &str) -> FolioResult<bool> {
            Ok(token == self.0)
        }
    }

    #[tokio::test]
    async fn free_documents_ignore_tokens() {
        let doc = Document::new(DocumentKind::KnowledgeBase, "Free").unwrap();
        for token in [None, Some(""), Some("bogus"), Some("secret")] {
            assert!(has_access(&doc, token, &Fixed("secret")).await.unwrap());
        }
    }

    #[tokio::test]
    async fn paid_documents_need_a_valid_token() {
        let mut doc = Document::new(DocumentKind::KnowledgeBase, "Paid").unwrap();
        doc.price_cents = 1_500;
        let validator = Fixed("secret");

        assert!(!has_access(&doc, None, &validator).await.unwrap());
        assert!(!has_access(&doc, Some("  "), &validator).await.unwrap());
        assert!(!has_access(&doc, Some("bogus"), &validator).await.unwrap());
        assert!(has_access(&doc, Some("secret"), &validator).await.unwrap());
    }
}
