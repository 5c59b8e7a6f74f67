use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::Path;

use super::{ScanSource, SourceError};
use crate::ingest::RawMobilityScan;

/// Streaming reader for JSON Lines scan dumps: one [`RawMobilityScan`] per line.
///
/// Blank lines are skipped. Only the current line is held in memory.
pub struct JsonLinesScanSource<R: BufRead + Seek> {
    name: String,
    reader: R,
    line: usize,
    buffer: String,
}

impl JsonLinesScanSource<BufReader<File>> {
    /// Open a JSON Lines file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, BufReader::new(file)))
    }
}

impl<R: BufRead + Seek> JsonLinesScanSource<R> {
    /// Wrap an already opened reader.
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead + Seek> ScanSource for JsonLinesScanSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_scan(&mut self) -> Result<Option<RawMobilityScan>, SourceError> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let record = self.buffer.trim();
            if record.is_empty() {
                continue;
            }

            return serde_json::from_str(record)
                .map(Some)
                .map_err(|source| SourceError::ParseError {
                    line: self.line,
                    source,
                });
        }
    }

    fn rewind(&mut self) -> Result<(), SourceError> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.line = 0;
        Ok(())
    }
}

/// Write scans as JSON Lines, the inverse of [`JsonLinesScanSource`].
pub fn write_json_lines<W: Write>(
    mut writer: W,
    scans: impl IntoIterator<Item = RawMobilityScan>,
) -> Result<usize, SourceError> {
    let mut written = 0;
    for scan in scans {
        serde_json::to_writer(&mut writer, &scan).map_err(SourceError::SerializeError)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
