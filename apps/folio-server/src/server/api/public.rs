use super::*;
use axum::{http::header, response::Html};
use folio_core::{to_markdown, PublicView, RenderedPage};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Html,
    Markdown,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicQuery {
    pub token: Option<String>,
    #[serde(default)]
    pub format: Format,
}

pub async fn get_public_view(
    Extension(context): Extension<Arc<Context>>,
    Path(doc): Path<String>,
    Query(query): Query<PublicQuery>,
) -> ApiResult<Json<PublicView>> {
    Ok(Json(context.viewer.view(&doc, query.token.as_deref()).await?))
}

pub async fn get_public_page(
    Extension(context): Extension<Arc<Context>>,
    Path((doc, page)): Path<(String, String)>,
    Query(query): Query<PublicQuery>,
) -> ApiResult<Response> {
    info!("get_public_page: {}, {}, {:?}", doc, page, query.format);
    let public = context.viewer.page(&doc, &page, query.token.as_deref()).await?;

    Ok(match query.format {
        Format::Json => Json(public).into_response(),
        Format::Html => Html(context.viewer.renderer().page_html(&RenderedPage::from(public))).into_response(),
        Format::Markdown => {
            let blocks = context.storage.list_blocks(&page).await?;
            (
                [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
                to_markdown(&blocks),
            )
                .into_response()
        }
    })
}
