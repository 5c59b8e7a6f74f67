//! Opaque append-and-get storage for scan payloads.
//!
//! The reconstruction pipeline only ever holds [`StorageHandle`]s. Payload bytes
//! are produced by [`ScanPayload::encode`] before `append` and decoded again by
//! readers after `get`.

use serde::{Deserialize, Serialize};

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use payload::ScanPayload;
pub use spill::SpillFileStorage;

mod error;
mod memory;
mod payload;
mod spill;


/// Handle to one stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageHandle(u64);

impl StorageHandle {
    /// Wrap a raw handle value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw handle value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StorageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only payload store.
pub trait ArrayStorage {
    /// Persist `bytes` and return a handle for later retrieval.
    fn append(&mut self, bytes: &[u8]) -> Result<StorageHandle, StorageError>;

    /// Read back the bytes stored under `handle`.
    fn get(&self, handle: StorageHandle) -> Result<Vec<u8>, StorageError>;

    /// Number of payloads stored.
    fn len(&self) -> usize;

    /// Whether nothing has been stored yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: ArrayStorage + ?Sized> ArrayStorage for Box<S> {
    fn append(&mut self, bytes: &[u8]) -> Result<StorageHandle, StorageError> {
        (**self).append(bytes)
    }

    fn get(&self, handle: StorageHandle) -> Result<Vec<u8>, StorageError> {
        (**self).get(handle)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
