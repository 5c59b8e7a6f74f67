/// Errors that can occur while reading decoded scans from a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error while reading or rewinding the source
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A record could not be parsed
    #[error("malformed record on line {line}: {source}")]
    ParseError {
        /// 1-based line number of the offending record
        line: usize,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized
    #[error("failed to serialize scan record: {0}")]
    SerializeError(#[source] serde_json::Error),
}
