/// Error types for compound file decoding.
use crate::common::binary::BinaryError;
use thiserror::Error;

/// Result type for compound file operations.
pub type Result<T> = std::result::Result<T, OleError>;

/// Error types for compound file decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OleError {
    /// The buffer is not a usable compound file (too short, bad magic,
    /// impossible geometry). Raised only while opening.
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// A sector chain is cyclic, dangling, or points past the buffer.
    #[error("Corrupt chain: {0}")]
    CorruptChain(String),

    /// An index or byte range lies outside the decoded extent.
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Primitive field decoding failed
    #[error("Binary decode error: {0}")]
    Binary(#[from] BinaryError),
}
