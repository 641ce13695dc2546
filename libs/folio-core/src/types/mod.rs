mod error;
mod store;

pub use error::{FolioError, FolioResult};
pub use store::DocumentStore;
