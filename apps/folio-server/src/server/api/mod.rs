mod blocks;
mod documents;
mod pages;
mod public;

use super::Context;
use crate::error_status::ErrorStatus;
use axum::{
    extract::{Json, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Extension, Router,
};
use folio_core::{info, DocumentStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type ApiResult<T> = Result<T, ErrorStatus>;

/// Full-replace reorder payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct Reorder {
    pub ids: Vec<String>,
}

pub fn api_handler(router: Router) -> Router {
    let api = Router::new()
        .route("/documents", post(documents::create_document))
        .route(
            "/documents/:doc",
            get(documents::get_document).patch(documents::update_document),
        )
        .route("/documents/:doc/publish", post(documents::set_published))
        .route("/documents/:doc/grants", post(documents::grant_access))
        .route(
            "/documents/:doc/pages",
            get(pages::list_pages).post(pages::create_page),
        )
        .route("/documents/:doc/pages/order", post(pages::reorder_root_pages))
        .route(
            "/pages/:page",
            patch(pages::rename_page).delete(pages::delete_page),
        )
        .route(
            "/pages/:page/blocks",
            get(blocks::list_blocks).post(blocks::create_block),
        )
        .route("/pages/:page/blocks/order", post(blocks::reorder_blocks))
        .route(
            "/blocks/:block",
            patch(blocks::update_block).delete(blocks::delete_block),
        );

    router.nest("/api", api)
}

pub fn public_handler(router: Router) -> Router {
    router
        .route("/public/:doc", get(public::get_public_view))
        .route("/public/:doc/pages/:page", get(public::get_public_page))
}
