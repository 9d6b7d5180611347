//! Error and Result types for journal operations.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for journal operations.
pub type Result<T> = std::result::Result<T, JournalError>;

/// The error type for journal operations.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Invalid magic bytes in the journal file header.
    #[error("Not a journal file: expected BJTS, got {0:?}")]
    NotAJournal([u8; 4]),

    /// Payload size is not a multiple of the sample width.
    #[error("Corrupt or partial journal: {size} payload bytes is not a multiple of width {width}")]
    Corrupt {
        /// Size of the payload in bytes (file size minus the header).
        size: u64,
        /// Sample width recorded in the header.
        width: i32,
    },

    /// Timestamp falls before the journal epoch.
    #[error("Timestamp {timestamp} is before journal epoch {epoch}")]
    OutOfRange {
        /// The slot-aligned timestamp of the request.
        timestamp: i64,
        /// The journal epoch.
        epoch: i64,
    },

    /// Caller-supplied arguments are invalid.
    #[error("Bad arguments: {0}")]
    BadArguments(String),

    /// Write attempted on a journal opened read-only.
    #[error("Journal is opened read-only")]
    ReadOnly,

    /// A non-blocking lock attempt found the file locked by another holder.
    #[error("File lock is held elsewhere")]
    LockBusy,

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
