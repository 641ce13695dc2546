use folio_core::FolioError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FolioStorageError {
    #[error("failed to access snapshot file")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode snapshot")]
    Serde(#[from] serde_json::Error),
    #[error("folio error")]
    Core(#[from] FolioError),
}

pub type FolioStorageResult<T> = Result<T, FolioStorageError>;

impl From<FolioStorageError> for FolioError {
    fn from(err: FolioStorageError) -> Self {
        match err {
            FolioStorageError::Core(err) => err,
            err => FolioError::External(match std::error::Error::source(&err) {
                Some(source) => format!("{err}: {source}"),
                None => err.to_string(),
            }),
        }
    }
}
