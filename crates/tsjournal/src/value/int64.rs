//! Signed 64-bit integer codec.

use crate::error::{JournalError, Result};
use crate::value::TAG_INT64;

/// Sample width of an int64 value.
const WIDTH: i32 = 8;

/// Codec for 64-bit signed integers, stored little-endian with
/// `i64::MIN` as the null sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Int64Codec;

impl Int64Codec {
    /// Returns the sample width, always 8 bytes.
    pub fn width(&self) -> i32 {
        WIDTH
    }

    /// Returns the on-disk type tag.
    pub fn type_tag(&self) -> i32 {
        TAG_INT64
    }

    /// Returns the little-endian encoding of `i64::MIN`.
    pub fn null(&self) -> [u8; 8] {
        i64::MIN.to_le_bytes()
    }

    /// Decodes little-endian integers from a buffer.
    pub fn decode(&self, buf: &[u8]) -> Result<Vec<i64>> {
        if buf.len() % WIDTH as usize != 0 {
            return Err(JournalError::BadArguments(format!(
                "buffer of {} bytes is not a multiple of width {WIDTH}",
                buf.len()
            )));
        }
        Ok(buf
            .chunks_exact(WIDTH as usize)
            .map(|chunk| i64::from_le_bytes(chunk.try_into().unwrap()))
            .collect())
    }

    /// Encodes integers as little-endian bytes.
    pub fn encode(&self, values: &[i64]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(values.len() * WIDTH as usize);
        for value in values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf
    }
}
