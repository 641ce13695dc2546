mod storage;
mod types;

pub use storage::FolioStorage;
pub use types::{FolioStorageError, FolioStorageResult};

use folio_core::{
    order::{apply_order, insert_by_key, sort_siblings},
    Block, BlockPatch, BlockType, Document, DocumentKind, DocumentSettings, DocumentStore, FolioError, FolioResult,
    Page, PageTree, TokenValidator,
};
use folio_logger::{debug, info, warn};
