/// Errors raised by an [`ArrayStorage`](super::ArrayStorage) backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error in a file-backed store
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The handle was never issued by this store
    #[error("unknown storage handle {0}")]
    UnknownHandle(u64),

    /// Stored bytes could not be decoded as a scan payload
    #[error("corrupt scan payload: {0}")]
    CorruptPayload(String),
}
