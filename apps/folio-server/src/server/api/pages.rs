use super::*;
use folio_core::{Page, PageNode, PageTree};

#[derive(Debug, Default, Deserialize)]
pub struct CreatePage {
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenamePage {
    pub title: String,
}

/// The sidebar tree, roots and children in sibling order.
pub async fn list_pages(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
) -> ApiResult<Json<Vec<PageNode>>> {
    let pages = context.storage.list_pages(&doc).await?;
    Ok(Json(PageTree::from_pages(&doc, pages).skeleton(false)))
}

pub async fn create_page(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
    Json(payload): Json<CreatePage>,
) -> ApiResult<Json<Page>> {
    info!("create_page: {}, {:?}", doc, payload.parent);
    Ok(Json(
        context
            .storage
            .create_page(&doc, payload.parent.as_deref())
            .await?,
    ))
}

pub async fn reorder_root_pages(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
    Json(payload): Json<Reorder>,
) -> ApiResult<StatusCode> {
    context.storage.reorder_root_pages(&doc, &payload.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rename_page(
    Extension(context): Extension<Arc<Context>>,
    Path(page): Path<String>,
    Json(payload): Json<RenamePage>,
) -> ApiResult<StatusCode> {
    context.storage.rename_page(&page, &payload.title).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_page(
    Extension(context): Extension<Arc<Context>>,
    Path(page): Path<String>,
) -> ApiResult<StatusCode> {
    info!("delete_page: {}", page);
    context.storage.delete_page(&page).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::{super::tests::client, *};
    use folio_core::DocumentKind;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_nested_pages() {
        let (context, client) = client();
        let document = context
            .storage
            .create_document(DocumentKind::KnowledgeBase, "Wiki")
            .await
            .unwrap();
        let doc = document.id;

        let root = client
            .post(&format!("/api/documents/{doc}/pages"))
            .json(&json!({}))
            .send()
            .await
            .json::<Value>()
            .await;
        let root = root["id"].as_str().unwrap().to_owned();
        let resp = client
            .post(&format!("/api/documents/{doc}/pages"))
            .json(&json!({ "parent": root }))
            .send()
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.json::<Value>().await["parent_id"], json!(root));

        let resp = client
            .post(&format!("/api/documents/{doc}/pages"))
            .json(&json!({ "parent": "ghost" }))
            .send()
            .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let tree = client
            .get(&format!("/api/documents/{doc}/pages"))
            .send()
            .await
            .json::<Value>()
            .await;
        assert_eq!(tree.as_array().unwrap().len(), 1);
        assert_eq!(tree[0]["children"].as_array().unwrap().len(), 1);
        assert_eq!(tree[0]["locked"], json!(false));

        // children move up when their parent goes
        let resp = client.delete(&format!("/api/pages/{root}")).send().await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let tree = client
            .get(&format!("/api/documents/{doc}/pages"))
            .send()
            .await
            .json::<Value>()
            .await;
        assert_eq!(tree.as_array().unwrap().len(), 1);
        assert!(tree[0].get("children").is_none());
    }
}
