use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use super::StorageError;

/// Decoded spectral payload of one mobility scan.
///
/// Layout: `u32` point count, then the m/z values, then the intensities, all
/// little-endian `f64`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPayload {
    /// m/z values
    pub mz: Vec<f64>,
    /// Intensity values
    pub intensity: Vec<f64>,
}

impl ScanPayload {
    /// Wrap equal-length arrays.
    pub fn new(mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self { mz, intensity }
    }

    /// The payload stored for buckets without real data.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of data points.
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Whether the payload holds no data points.
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Encode arrays into payload bytes without taking ownership.
    pub fn encode_arrays(mz: &[f64], intensity: &[f64]) -> Vec<u8> {
        let count = mz.len().min(intensity.len());
        let mut bytes = Vec::with_capacity(4 + count * 16);
        bytes.extend_from_slice(&(count as u32).to_le_bytes());
        for &value in &mz[..count] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for &value in &intensity[..count] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Encode into payload bytes.
    pub fn encode(&self) -> Vec<u8> {
        Self::encode_arrays(&self.mz, &self.intensity)
    }

    /// Decode payload bytes produced by [`ScanPayload::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        let mut cursor = Cursor::new(bytes);
        let count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| StorageError::CorruptPayload("missing point count".to_string()))?
            as usize;

        let expected = 4 + count * 16;
        if bytes.len() != expected {
            return Err(StorageError::CorruptPayload(format!(
                "expected {expected} bytes for {count} points, found {}",
                bytes.len()
            )));
        }

        let mut mz = vec![0.0; count];
        let mut intensity = vec![0.0; count];
        cursor
            .read_f64_into::<LittleEndian>(&mut mz)
            .and_then(|_| cursor.read_f64_into::<LittleEndian>(&mut intensity))
            .map_err(|e| StorageError::CorruptPayload(e.to_string()))?;

        Ok(Self { mz, intensity })
    }
}
