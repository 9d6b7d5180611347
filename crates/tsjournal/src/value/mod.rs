//! Value types stored in a journal.
//!
//! Every journal is bound to exactly one codec that fixes the sample
//! width, the on-disk type tag, and the null sentinel used to fill
//! unwritten slots. The registry is closed: the five tags below are the
//! only ones a version-0 file may carry.
//!
//! | tag    | codec              | width  | null sentinel            |
//! |--------|--------------------|--------|--------------------------|
//! | `0x00` | byte blob          | user   | `NULL` padded with spaces|
//! | `0x01` | byte blob          | user   | all zero bytes           |
//! | `0x0F` | byte blob          | user   | user-defined at create   |
//! | `0x10` | IEEE-754 binary64  | 8      | quiet NaN                |
//! | `0x11` | signed 64-bit int  | 8      | `i64::MIN`               |
//!
//! Numeric payloads and nulls are little-endian. A journal reopened from
//! disk resolves its codec purely from the `(type_tag, width)` pair in
//! the header; tag `0x0F` cannot recover the original user null and is
//! resolved with tag `0x00`'s sentinel instead.

mod bytes;
mod float64;
mod int64;

pub use bytes::ByteCodec;
pub use float64::Float64Codec;
pub use int64::Int64Codec;

use crate::error::{JournalError, Result};

/// Type tag for byte blobs whose null sentinel is the ASCII string
/// `NULL` padded with spaces.
pub const TAG_BYTES_NULL: i32 = 0x00;

/// Type tag for byte blobs whose null sentinel is all zero bytes.
pub const TAG_BYTES_ZERO: i32 = 0x01;

/// Type tag for byte blobs with a user-defined null sentinel that is not
/// recorded in the header.
pub const TAG_BYTES_OPAQUE: i32 = 0x0F;

/// Type tag for IEEE-754 binary64 samples.
pub const TAG_FLOAT64: i32 = 0x10;

/// Type tag for two's-complement signed 64-bit integer samples.
pub const TAG_INT64: i32 = 0x11;

/// A typed sequence of samples, one variant per registered codec family.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Fixed-width byte groups.
    Bytes(Vec<Vec<u8>>),
    /// 64-bit floats.
    Float64(Vec<f64>),
    /// 64-bit signed integers.
    Int64(Vec<i64>),
}

impl Values {
    /// Returns the number of samples in the sequence.
    pub fn len(&self) -> usize {
        match self {
            Values::Bytes(v) => v.len(),
            Values::Float64(v) => v.len(),
            Values::Int64(v) => v.len(),
        }
    }

    /// Returns true if the sequence holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Vec<u8>>> for Values {
    fn from(v: Vec<Vec<u8>>) -> Self {
        Values::Bytes(v)
    }
}

impl From<Vec<f64>> for Values {
    fn from(v: Vec<f64>) -> Self {
        Values::Float64(v)
    }
}

impl From<Vec<i64>> for Values {
    fn from(v: Vec<i64>) -> Self {
        Values::Int64(v)
    }
}

/// A sample codec bound to a journal for its open lifetime.
///
/// Codecs are stateless descriptors; two instances with the same tag and
/// width are interchangeable.
#[derive(Debug, Clone, PartialEq)]
pub enum Codec {
    /// Fixed-width byte blobs (tags `0x00`, `0x01`, `0x0F`).
    Bytes(ByteCodec),
    /// IEEE-754 binary64 (tag `0x10`).
    Float64(Float64Codec),
    /// Signed 64-bit integers (tag `0x11`).
    Int64(Int64Codec),
}

impl Codec {
    /// Returns the on-disk type tag identifying this codec.
    pub fn type_tag(&self) -> i32 {
        match self {
            Codec::Bytes(c) => c.type_tag(),
            Codec::Float64(c) => c.type_tag(),
            Codec::Int64(c) => c.type_tag(),
        }
    }

    /// Returns the sample width in bytes.
    pub fn width(&self) -> i32 {
        match self {
            Codec::Bytes(c) => c.width(),
            Codec::Float64(c) => c.width(),
            Codec::Int64(c) => c.width(),
        }
    }

    /// Returns the `width()`-byte null sentinel for unwritten slots.
    pub fn null(&self) -> Vec<u8> {
        match self {
            Codec::Bytes(c) => c.null().to_vec(),
            Codec::Float64(c) => c.null().to_vec(),
            Codec::Int64(c) => c.null().to_vec(),
        }
    }

    /// Decodes a buffer whose length is a multiple of `width()` into a
    /// typed sequence of `buf.len() / width()` samples.
    ///
    /// # Errors
    ///
    /// Returns `BadArguments` if the buffer length is not a multiple of
    /// the sample width.
    pub fn decode(&self, buf: &[u8]) -> Result<Values> {
        match self {
            Codec::Bytes(c) => Ok(Values::Bytes(c.decode(buf)?)),
            Codec::Float64(c) => Ok(Values::Float64(c.decode(buf)?)),
            Codec::Int64(c) => Ok(Values::Int64(c.decode(buf)?)),
        }
    }

    /// Encodes a typed sequence to `width() * values.len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns `BadArguments` if the sequence variant does not match the
    /// codec, or if a byte group has the wrong width.
    pub fn encode(&self, values: &Values) -> Result<Vec<u8>> {
        match (self, values) {
            (Codec::Bytes(c), Values::Bytes(v)) => c.encode(v),
            (Codec::Float64(c), Values::Float64(v)) => Ok(c.encode(v)),
            (Codec::Int64(c), Values::Int64(v)) => Ok(c.encode(v)),
            _ => Err(JournalError::BadArguments(
                "value sequence does not match the journal codec".to_string(),
            )),
        }
    }
}

/// Resolves the codec for a `(type_tag, width)` pair read from a header.
///
/// The byte-blob tags reconstruct their null sentinel from the tag alone:
/// `0x01` is all zeros, while `0x00` and `0x0F` both resolve to the
/// `NULL`-with-spaces sentinel (the original user null behind `0x0F` is
/// not preserved on disk).
///
/// # Errors
///
/// Returns `BadArguments` when the width is non-positive or inconsistent
/// with a fixed-width codec.
///
/// # Panics
///
/// Panics on a tag outside the registry. The tag was written by trusted
/// code, so an unknown value means a newer format version or a corrupt
/// header that survived the magic check.
pub fn resolve(type_tag: i32, width: i32) -> Result<Codec> {
    if width <= 0 {
        return Err(JournalError::BadArguments(format!(
            "sample width must be positive, got {width}"
        )));
    }
    match type_tag {
        TAG_BYTES_ZERO => Ok(Codec::Bytes(ByteCodec::new(width, &[]))),
        TAG_BYTES_NULL | TAG_BYTES_OPAQUE => {
            let mut null = b"NULL".to_vec();
            null.resize(width as usize, b' ');
            Ok(Codec::Bytes(ByteCodec::new(width, &null)))
        }
        TAG_FLOAT64 => {
            if width != 8 {
                return Err(JournalError::BadArguments(format!(
                    "float64 samples are 8 bytes wide, header says {width}"
                )));
            }
            Ok(Codec::Float64(Float64Codec))
        }
        TAG_INT64 => {
            if width != 8 {
                return Err(JournalError::BadArguments(format!(
                    "int64 samples are 8 bytes wide, header says {width}"
                )));
            }
            Ok(Codec::Int64(Int64Codec))
        }
        tag => panic!("unknown value type tag {tag:#04x} (width {width})"),
    }
}
