//! IEEE-754 binary64 codec.

use crate::error::{JournalError, Result};
use crate::value::TAG_FLOAT64;

/// Sample width of a binary64 value.
const WIDTH: i32 = 8;

/// Codec for 64-bit floats, stored little-endian with NaN as the null
/// sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Float64Codec;

impl Float64Codec {
    /// Returns the sample width, always 8 bytes.
    pub fn width(&self) -> i32 {
        WIDTH
    }

    /// Returns the on-disk type tag.
    pub fn type_tag(&self) -> i32 {
        TAG_FLOAT64
    }

    /// Returns the little-endian encoding of a quiet NaN.
    pub fn null(&self) -> [u8; 8] {
        f64::NAN.to_le_bytes()
    }

    /// Decodes little-endian floats from a buffer.
    pub fn decode(&self, buf: &[u8]) -> Result<Vec<f64>> {
        if buf.len() % WIDTH as usize != 0 {
            return Err(JournalError::BadArguments(format!(
                "buffer of {} bytes is not a multiple of width {WIDTH}",
                buf.len()
            )));
        }
        Ok(buf
            .chunks_exact(WIDTH as usize)
            .map(|chunk| f64::from_le_bytes(chunk.try_into().unwrap()))
            .collect())
    }

    /// Encodes floats as little-endian bytes.
    pub fn encode(&self, values: &[f64]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(values.len() * WIDTH as usize);
        for value in values {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf
    }
}
