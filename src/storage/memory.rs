use super::{ArrayStorage, StorageError, StorageHandle};

/// In-memory store: one contiguous buffer plus an extent table.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    buffer: Vec<u8>,
    extents: Vec<(usize, usize)>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total payload bytes held.
    pub fn byte_len(&self) -> usize {
        self.buffer.len()
    }
}

impl ArrayStorage for MemoryStorage {
    fn append(&mut self, bytes: &[u8]) -> Result<StorageHandle, StorageError> {
        let handle = StorageHandle::new(self.extents.len() as u64);
        self.extents.push((self.buffer.len(), bytes.len()));
        self.buffer.extend_from_slice(bytes);
        Ok(handle)
    }

    fn get(&self, handle: StorageHandle) -> Result<Vec<u8>, StorageError> {
        let (start, len) = usize::try_from(handle.get())
            .ok()
            .and_then(|idx| self.extents.get(idx).copied())
            .ok_or(StorageError::UnknownHandle(handle.get()))?;
        Ok(self.buffer[start..start + len].to_vec())
    }

    fn len(&self) -> usize {
        self.extents.len()
    }
}
