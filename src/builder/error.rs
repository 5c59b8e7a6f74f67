use crate::source::SourceError;
use crate::storage::StorageError;

/// Fatal errors that abort the import of a whole file
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The scan source failed
    #[error("failed to read {file}: {source}")]
    Read {
        /// Source file name
        file: String,
        /// Underlying read error
        #[source]
        source: SourceError,
    },

    /// The payload store failed
    #[error("failed to store scan data of {file}: {source}")]
    Storage {
        /// Source file name
        file: String,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },

}
