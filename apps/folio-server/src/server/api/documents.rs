use super::*;
use axum::http::HeaderMap;
use folio_core::{warn, Document, DocumentKind, DocumentSettings};

/// Header carrying the shared grant secret.
pub const GRANT_SECRET_HEADER: &str = "x-folio-grant-secret";

#[derive(Debug, Deserialize)]
pub struct CreateDocument {
    pub kind: DocumentKind,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPublished {
    pub published: bool,
}

#[derive(Debug, Serialize)]
pub struct AccessGrant {
    pub token: String,
}

pub async fn create_document(
    Extension(context): Extension<Arc<Context>>,
    Json(payload): Json<CreateDocument>,
) -> ApiResult<Json<Document>> {
    info!("create_document: {:?}", payload.kind);
    Ok(Json(
        context
            .storage
            .create_document(payload.kind, &payload.title)
            .await?,
    ))
}

pub async fn get_document(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
) -> ApiResult<Json<Document>> {
    Ok(Json(context.storage.get_document(&doc).await?))
}

pub async fn update_document(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
    Json(settings): Json<DocumentSettings>,
) -> ApiResult<Json<Document>> {
    info!("update_document: {}", doc);
    Ok(Json(context.storage.update_document(&doc, settings).await?))
}

pub async fn set_published(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
    Json(payload): Json<SetPublished>,
) -> ApiResult<Json<Document>> {
    info!("set_published: {}, {}", doc, payload.published);
    Ok(Json(
        context
            .storage
            .set_published(&doc, payload.published)
            .await?,
    ))
}

/// Issue a purchase token, called by the checkout integration once a
/// payment for the document has cleared. Requires the grant secret.
pub async fn grant_access(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<AccessGrant>> {
    let Some(secret) = context.grant_secret.as_deref() else {
        return Err(ErrorStatus::Forbidden("access grants are disabled".into()));
    };
    let presented = headers
        .get(GRANT_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(secret) {
        warn!("rejected access grant for document {doc}");
        return Err(ErrorStatus::Unauthorized);
    }

    let token = context.storage.grant_access(&doc).await?;
    Ok(Json(AccessGrant { token }))
}
