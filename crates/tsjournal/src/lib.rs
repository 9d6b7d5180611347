//! Fixed-interval time series journal storage.
//!
//! This crate provides an on-disk log that stores a strictly regular
//! sequence of typed, fixed-width samples, one per time slot,
//! addressable by Unix timestamp.
//!
//! # Components
//!
//! - [`Journal`]: slot-addressed engine over a single file (create,
//!   open, gap-filling writes, range reads)
//! - [`Codec`] / [`Values`]: pluggable sample codecs with typed
//!   sequences and per-type null sentinels
//! - [`lock`]: advisory whole-file locking held for a journal's open
//!   lifetime
//!
//! # Example
//!
//! ```rust,ignore
//! use tsjournal::{Codec, Int64Codec, Journal, Values};
//!
//! // One slot every 60 seconds, int64 samples.
//! let mut journal = Journal::create(path, 60, Codec::Int64(Int64Codec), &[])?;
//!
//! // The first write fixes the epoch to the aligned timestamp.
//! journal.write(1449240543, &Values::Int64(vec![4, 8, 15, 16, 23, 42]))?;
//!
//! // Read a contiguous range back, starting at any slot.
//! let values = journal.read(1449240540, 6)?;
//! journal.sync()?;
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod journal;
pub mod lock;
pub mod value;

pub use error::{JournalError, Result};
pub use journal::{Journal, JournalHeader, HEADER_SIZE, MAGIC, MAX_META, VERSION};
pub use value::{ByteCodec, Codec, Float64Codec, Int64Codec, Values};
