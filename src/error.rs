//! Error types for metafile decoding and replay
//!
//! Header-level failures abort decoding of a file. Record-level failures are
//! reported through the same type but are handled by the record loops and the
//! replay dispatcher, which log them and carry on.

use thiserror::Error;

/// Error type for decode and replay operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetafileError {
    #[error("Unrecognized metafile format")]
    UnknownFormat,

    #[error("Invalid signature: expected {expected:#010x}, found {found:#010x}")]
    InvalidSignature { expected: u32, found: u32 },

    #[error("Truncated header: need {needed} bytes, have {available}")]
    TruncatedHeader { needed: usize, available: usize },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid header record type: {0}")]
    InvalidRecordType(u32),

    #[error("Invalid header size: {0}")]
    InvalidHeaderSize(u32),

    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },
}

impl MetafileError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        MetafileError::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result type alias for decode and replay operations
pub type MetafileResult<T> = Result<T, MetafileError>;
