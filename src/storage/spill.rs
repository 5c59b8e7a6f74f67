use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use log::debug;

use super::{ArrayStorage, StorageError, StorageHandle};

/// File-backed store that spills payloads to an anonymous temporary file.
///
/// The file is removed by the OS once the store is dropped.
pub struct SpillFileStorage {
    file: File,
    extents: Vec<(u64, usize)>,
    end: u64,
}

impl SpillFileStorage {
    /// Create a store backed by a fresh temporary file.
    pub fn new() -> Result<Self, StorageError> {
        let file = tempfile::tempfile()?;
        debug!("Spilling scan payloads to an anonymous temporary file");
        Ok(Self {
            file,
            extents: Vec::new(),
            end: 0,
        })
    }

    /// Bytes written to the spill file so far.
    pub fn byte_len(&self) -> u64 {
        self.end
    }
}

impl ArrayStorage for SpillFileStorage {
    fn append(&mut self, bytes: &[u8]) -> Result<StorageHandle, StorageError> {
        // reads move the cursor
        self.file.seek(SeekFrom::Start(self.end))?;
        self.file.write_all(bytes)?;

        let handle = StorageHandle::new(self.extents.len() as u64);
        self.extents.push((self.end, bytes.len()));
        self.end += bytes.len() as u64;
        Ok(handle)
    }

    fn get(&self, handle: StorageHandle) -> Result<Vec<u8>, StorageError> {
        let (offset, len) = usize::try_from(handle.get())
            .ok()
            .and_then(|idx| self.extents.get(idx).copied())
            .ok_or(StorageError::UnknownHandle(handle.get()))?;

        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))?;
        let mut bytes = vec![0u8; len];
        file.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn len(&self) -> usize {
        self.extents.len()
    }
}
