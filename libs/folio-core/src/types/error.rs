use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FolioError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("document {0} not found")]
    DocumentNotFound(String),
    #[error("page {0} not found")]
    PageNotFound(String),
    #[error("block {0} not found")]
    BlockNotFound(String),
    #[error("page {page} cannot be placed under its own descendant {parent}")]
    CyclicParent { page: String, parent: String },
    #[error("order does not match the sibling set: {0}")]
    OrderMismatch(String),
    #[error("position {index} out of range for {len} siblings")]
    PositionOutOfRange { index: usize, len: usize },
    #[error("access to document {0} denied")]
    AccessDenied(String),
    #[error("external error: {0}")]
    External(String),
}

impl FolioError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DocumentNotFound(_) | Self::PageNotFound(_) | Self::BlockNotFound(_)
        )
    }
}

pub type FolioResult<T = (), E = FolioError> = Result<T, E>;
