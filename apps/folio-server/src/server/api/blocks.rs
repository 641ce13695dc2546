use super::*;
use folio_core::{Block, BlockPatch, BlockType};

#[derive(Debug, Deserialize)]
pub struct CreateBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub sort_position: i64,
}

pub async fn list_blocks(
    Extension(context): Extension<Arc<Context>>,
    Path(page): Path<String>,
) -> ApiResult<Json<Vec<Block>>> {
    Ok(Json(context.storage.list_blocks(&page).await?))
}

pub async fn create_block(
    Extension(context): Extension<Arc<Context>>,
    Path(page): Path<String>,
    Json(payload): Json<CreateBlock>,
) -> ApiResult<Json<Block>> {
    info!("create_block: {}, {}@{}", page, payload.block_type, payload.sort_position);
    Ok(Json(
        context
            .storage
            .create_block(&page, payload.block_type, payload.sort_position)
            .await?,
    ))
}

pub async fn reorder_blocks(
    Extension(context): Extension<Arc<Context>>,
    Path(page): Path<String>,
    Json(payload): Json<Reorder>,
) -> ApiResult<StatusCode> {
    context.storage.reorder_blocks(&page, &payload.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_block(
    Extension(context): Extension<Arc<Context>>,
    Path(block): Path<String>,
    Json(patch): Json<BlockPatch>,
) -> ApiResult<StatusCode> {
    if patch.is_empty() {
        return Err(ErrorStatus::BadRequest("empty block update".into()));
    }
    context.storage.update_block(&block, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_block(
    Extension(context): Extension<Arc<Context>>,
    Path(block): Path<String>,
) -> ApiResult<StatusCode> {
    context.storage.delete_block(&block).await?;
    Ok(StatusCode::NO_CONTENT)
}
