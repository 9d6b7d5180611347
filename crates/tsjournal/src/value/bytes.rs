//! Fixed-width byte-blob codec with a user-definable null sentinel.

use crate::error::{JournalError, Result};
use crate::value::{TAG_BYTES_NULL, TAG_BYTES_OPAQUE, TAG_BYTES_ZERO};

/// Codec for opaque fixed-width byte groups.
///
/// The payload passes through unchanged; the only policy a byte-blob
/// codec carries is its null sentinel, chosen at create time. The
/// sentinel content determines the tag written to the header: all zeros
/// is `0x01`, an ASCII `NULL` prefix is `0x00`, anything else is `0x0F`.
#[derive(Debug, Clone, PartialEq)]
pub struct ByteCodec {
    width: i32,
    null: Vec<u8>,
}

impl ByteCodec {
    /// Creates a byte-blob codec with the given sample width and null
    /// sentinel.
    ///
    /// A sentinel shorter than `width` is right-padded with zero bytes;
    /// a longer one is truncated to `width`.
    pub fn new(width: i32, null: &[u8]) -> Self {
        let mut null = null.to_vec();
        null.resize(width.max(0) as usize, 0x00);
        Self { width, null }
    }

    /// Returns the sample width in bytes.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Returns the type tag derived from the null sentinel content.
    pub fn type_tag(&self) -> i32 {
        if self.null.iter().all(|&b| b == 0x00) {
            TAG_BYTES_ZERO
        } else if self.null.starts_with(b"NULL") {
            TAG_BYTES_NULL
        } else {
            TAG_BYTES_OPAQUE
        }
    }

    /// Returns the null sentinel, exactly `width()` bytes.
    pub fn null(&self) -> &[u8] {
        &self.null
    }

    /// Splits a buffer into `width()`-byte groups.
    pub fn decode(&self, buf: &[u8]) -> Result<Vec<Vec<u8>>> {
        let width = self.width as usize;
        if buf.len() % width != 0 {
            return Err(JournalError::BadArguments(format!(
                "buffer of {} bytes is not a multiple of width {}",
                buf.len(),
                self.width
            )));
        }
        Ok(buf.chunks_exact(width).map(<[u8]>::to_vec).collect())
    }

    /// Concatenates byte groups for storage.
    ///
    /// # Errors
    ///
    /// Returns `BadArguments` if any group is not exactly `width()`
    /// bytes long.
    pub fn encode(&self, values: &[Vec<u8>]) -> Result<Vec<u8>> {
        let width = self.width as usize;
        let mut buf = Vec::with_capacity(width * values.len());
        for group in values {
            if group.len() != width {
                return Err(JournalError::BadArguments(format!(
                    "byte group of {} bytes does not match width {}",
                    group.len(),
                    self.width
                )));
            }
            buf.extend_from_slice(group);
        }
        Ok(buf)
    }
}
