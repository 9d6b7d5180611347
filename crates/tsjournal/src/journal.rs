//! Fixed-interval journal file format and engine.
//!
//! A journal stores one fixed-width sample per time slot, densely packed
//! behind a constant 64-byte header. Slot `k` holds the sample for
//! timestamp `epoch + k * interval`; unwritten slots inside the
//! populated range carry the codec's null sentinel.
//!
//! ## File Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  File Header (64 bytes)                                      │
//! │  - Magic: "BJTS" (4 bytes)                                   │
//! │  - Version: i32 (4 bytes) = 0                                │
//! │  - Type tag: i32 (4 bytes)                                   │
//! │  - Width: i32 (4 bytes)                                      │
//! │  - Interval: i64 (8 bytes)                                   │
//! │  - Meta: 4 x i64 (32 bytes)                                  │
//! │  - Epoch: i64 (8 bytes), 0 while the file holds no samples   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Samples (point_count x width bytes, densely packed)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All multi-byte integers are little-endian. The header is written once
//! at create; only the epoch field ever changes afterwards, stamped by
//! the first write together with its payload in a single positional
//! write.

use crate::error::{JournalError, Result};
use crate::lock;
use crate::value::{self, Codec, Values};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Magic bytes for the journal file header: "BJTS"
pub const MAGIC: [u8; 4] = [0x42, 0x4A, 0x54, 0x53];

/// Current journal file format version.
pub const VERSION: i32 = 0;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 64;

/// Number of metadata slots in the header.
pub const MAX_META: usize = 4;

/// Byte offset of the epoch field inside the header.
const EPOCH_OFFSET: u64 = (HEADER_SIZE - 8) as u64;

/// Journal file header (64 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalHeader {
    /// Magic bytes: "BJTS"
    pub magic: [u8; 4],
    /// File format version (currently 0).
    pub version: i32,
    /// Type tag of the bound codec.
    pub type_tag: i32,
    /// Sample width in bytes.
    pub width: i32,
    /// Time units between adjacent slots.
    pub interval: i64,
    /// User metadata slots; input shorter than four is zero-padded.
    pub meta: [i64; MAX_META],
    /// Timestamp of slot 0; `0` while the journal holds no samples.
    pub epoch: i64,
}

impl JournalHeader {
    /// Writes the header to a writer using little-endian byte order.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        // Magic (4 bytes)
        writer.write_all(&self.magic)?;
        // Version (4 bytes)
        writer.write_all(&self.version.to_le_bytes())?;
        // Type tag (4 bytes)
        writer.write_all(&self.type_tag.to_le_bytes())?;
        // Width (4 bytes)
        writer.write_all(&self.width.to_le_bytes())?;
        // Interval (8 bytes)
        writer.write_all(&self.interval.to_le_bytes())?;
        // Meta (4 x 8 bytes)
        for slot in &self.meta {
            writer.write_all(&slot.to_le_bytes())?;
        }
        // Epoch (8 bytes)
        writer.write_all(&self.epoch.to_le_bytes())?;

        Ok(())
    }

    /// Reads a header from a reader using little-endian byte order.
    ///
    /// # Errors
    ///
    /// Returns `JournalError::NotAJournal` if the magic bytes don't match.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf)?;

        // Magic (4 bytes)
        let magic: [u8; 4] = buf[0..4].try_into().unwrap();
        if magic != MAGIC {
            return Err(JournalError::NotAJournal(magic));
        }

        // Version (4 bytes)
        let version = i32::from_le_bytes(buf[4..8].try_into().unwrap());

        // Type tag (4 bytes)
        let type_tag = i32::from_le_bytes(buf[8..12].try_into().unwrap());

        // Width (4 bytes)
        let width = i32::from_le_bytes(buf[12..16].try_into().unwrap());

        // Interval (8 bytes)
        let interval = i64::from_le_bytes(buf[16..24].try_into().unwrap());

        // Meta (4 x 8 bytes)
        let mut meta = [0i64; MAX_META];
        for (i, slot) in meta.iter_mut().enumerate() {
            let at = 24 + i * 8;
            *slot = i64::from_le_bytes(buf[at..at + 8].try_into().unwrap());
        }

        // Epoch (8 bytes)
        let epoch = i64::from_le_bytes(buf[56..64].try_into().unwrap());

        Ok(Self {
            magic,
            version,
            type_tag,
            width,
            interval,
            meta,
            epoch,
        })
    }
}

/// Aligns a timestamp down to the interval grid.
fn align(timestamp: i64, interval: i64) -> i64 {
    timestamp - timestamp % interval
}

/// An open fixed-interval journal.
///
/// The handle exclusively owns the underlying descriptor and holds an
/// advisory whole-file lock for its open lifetime: exclusive when the
/// journal is writable, shared when it fell back to read-only. Within
/// one handle operations are sequentially ordered by call order.
#[derive(Debug)]
pub struct Journal {
    /// The locked descriptor.
    file: File,
    /// Path the journal was created or opened at.
    path: PathBuf,
    /// Cached header image; only the epoch field ever changes after
    /// create, once, on the first write.
    header: JournalHeader,
    /// Codec bound at create or resolved from the header at open.
    codec: Codec,
    /// Number of samples on disk, derived from the file size at open.
    points: u64,
    /// Set when the descriptor could only be opened read-only.
    readonly: bool,
}

impl Journal {
    /// Creates a journal at the given path, truncating any existing file
    /// and creating parent directories as needed.
    ///
    /// The codec fixes the sample type for the life of the file; the
    /// interval is the number of time units between adjacent slots. Up
    /// to four metadata values are stored in the header, zero-padded.
    ///
    /// # Errors
    ///
    /// Returns `BadArguments` for a non-positive interval or width, more
    /// than four metadata values, or a non-directory in the way of the
    /// parent path. I/O and locking failures surface as `Io`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        interval: i64,
        codec: Codec,
        meta: &[i64],
    ) -> Result<Journal> {
        let path = path.as_ref();

        if interval <= 0 {
            return Err(JournalError::BadArguments(format!(
                "interval must be positive, got {interval}"
            )));
        }
        if codec.width() <= 0 {
            return Err(JournalError::BadArguments(format!(
                "sample width must be positive, got {}",
                codec.width()
            )));
        }
        if meta.len() > MAX_META {
            return Err(JournalError::BadArguments(format!(
                "metadata holds at most {MAX_META} values, got {}",
                meta.len()
            )));
        }

        // Create the base directory, if needed.
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                match fs::metadata(dir) {
                    Ok(info) if !info.is_dir() => {
                        return Err(JournalError::BadArguments(format!(
                            "{} is in the way of directory creation",
                            dir.display()
                        )));
                    }
                    Ok(_) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        fs::create_dir_all(dir)?;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        lock::exclusive(&file)?;

        let mut header = JournalHeader {
            magic: MAGIC,
            version: VERSION,
            type_tag: codec.type_tag(),
            width: codec.width(),
            interval,
            meta: [0; MAX_META],
            epoch: 0,
        };
        header.meta[..meta.len()].copy_from_slice(meta);

        let mut buf = Vec::with_capacity(HEADER_SIZE);
        header.write_to(&mut buf)?;
        file.write_all_at(&buf, 0)?;
        file.sync_all()?;

        debug!(
            path = %path.display(),
            type_tag = header.type_tag,
            width = header.width,
            interval,
            "created journal"
        );

        Ok(Journal {
            file,
            path: path.to_path_buf(),
            header,
            codec,
            points: 0,
            readonly: false,
        })
    }

    /// Opens an existing journal.
    ///
    /// The file is opened read/write when permissions allow, read-only
    /// otherwise; the lock mode matches (exclusive vs shared). The codec
    /// is resolved from the `(type_tag, width)` pair in the header.
    ///
    /// # Errors
    ///
    /// Returns `NotAJournal` on a magic mismatch and `Corrupt` when the
    /// payload size is not a multiple of the sample width.
    ///
    /// # Panics
    ///
    /// Panics if the header carries a type tag outside the registry,
    /// like [`value::resolve`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Journal> {
        let path = path.as_ref();

        let (file, readonly) = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => (file, false),
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                (File::open(path)?, true)
            }
            Err(err) => return Err(err.into()),
        };

        if readonly {
            lock::shared(&file)?;
        } else {
            lock::exclusive(&file)?;
        }

        let mut buf = [0u8; HEADER_SIZE];
        file.read_exact_at(&mut buf, 0)?;
        let header = JournalHeader::read_from(&mut &buf[..])?;

        let codec = value::resolve(header.type_tag, header.width)?;

        let size = file.metadata()?.len();
        let payload = size
            .checked_sub(HEADER_SIZE as u64)
            .ok_or(JournalError::Corrupt {
                size,
                width: header.width,
            })?;
        if payload % header.width as u64 != 0 {
            return Err(JournalError::Corrupt {
                size: payload,
                width: header.width,
            });
        }
        let points = payload / header.width as u64;

        if (header.epoch == 0) != (points == 0) {
            warn!(
                path = %path.display(),
                epoch = header.epoch,
                points,
                "journal epoch and sample count disagree"
            );
        }

        debug!(
            path = %path.display(),
            type_tag = header.type_tag,
            points,
            readonly,
            "opened journal"
        );

        Ok(Journal {
            file,
            path: path.to_path_buf(),
            header,
            codec,
            points,
            readonly,
        })
    }

    /// Writes a typed sequence of samples starting at the slot for the
    /// given timestamp, which is aligned down to the interval grid.
    ///
    /// The first write stamps the journal epoch; later writes may
    /// overwrite existing slots, extend the file, or fill a gap of
    /// unwritten slots with the codec's null sentinel. An empty sequence
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ReadOnly` when the journal was opened read-only,
    /// `OutOfRange` when the aligned timestamp falls before the epoch,
    /// and `BadArguments` when the sequence does not match the codec.
    pub fn write(&mut self, timestamp: i64, values: &Values) -> Result<()> {
        if self.readonly {
            return Err(JournalError::ReadOnly);
        }
        if values.is_empty() {
            return Ok(());
        }

        let ts = align(timestamp, self.header.interval);
        let encoded = self.codec.encode(values)?;
        let count = values.len() as u64;
        let width = self.header.width as u64;

        if self.header.epoch == 0 {
            // First write. The epoch stamp and the payload go out as one
            // contiguous positional write starting at the epoch field, so
            // the epoch is only observable once samples sit behind it.
            let mut buf = Vec::with_capacity(8 + encoded.len());
            buf.extend_from_slice(&ts.to_le_bytes());
            buf.extend_from_slice(&encoded);
            self.file.write_all_at(&buf, EPOCH_OFFSET)?;

            self.header.epoch = ts;
            self.points = count;
            debug!(epoch = ts, samples = count, "first write fixed journal epoch");
            return Ok(());
        }

        if ts < self.header.epoch {
            // A rewrite with an earlier epoch is left to a higher layer.
            return Err(JournalError::OutOfRange {
                timestamp: ts,
                epoch: self.header.epoch,
            });
        }
        let slot = ((ts - self.header.epoch) / self.header.interval) as u64;

        if slot > self.points {
            // Fill the gap between the end of file and the target slot
            // with null samples, in the same write as the payload.
            let gap = slot - self.points;
            let null = self.codec.null();
            let mut buf = Vec::with_capacity(gap as usize * null.len() + encoded.len());
            for _ in 0..gap {
                buf.extend_from_slice(&null);
            }
            buf.extend_from_slice(&encoded);
            self.file
                .write_all_at(&buf, HEADER_SIZE as u64 + self.points * width)?;

            debug!(slots = gap, "filled write gap with null samples");
            self.points = slot + count;
        } else {
            // Appending at the end of the file (normal) or overwriting
            // somewhere in the middle (allowed).
            self.file
                .write_all_at(&encoded, HEADER_SIZE as u64 + slot * width)?;
            self.points = self.points.max(slot + count);
        }

        Ok(())
    }

    /// Reads up to `count` samples starting at the slot for the given
    /// timestamp, which is aligned down to the interval grid.
    ///
    /// Reading past the end of the populated range yields a short,
    /// possibly empty, sequence; callers distinguish end-of-file from a
    /// full read by comparing `Values::len` with the request.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` when the aligned timestamp falls before the
    /// epoch of a non-empty journal. Hard I/O failures surface as `Io`.
    pub fn read(&self, timestamp: i64, count: usize) -> Result<Values> {
        let ts = align(timestamp, self.header.interval);
        if self.header.epoch == 0 {
            return self.codec.decode(&[]);
        }
        if ts < self.header.epoch {
            return Err(JournalError::OutOfRange {
                timestamp: ts,
                epoch: self.header.epoch,
            });
        }

        let slot = ((ts - self.header.epoch) / self.header.interval) as u64;
        let width = self.header.width as u64;
        let offset = HEADER_SIZE as u64 + slot.saturating_mul(width);

        let mut buf = vec![0u8; count.saturating_mul(width as usize)];
        let got = read_full_at(&self.file, &mut buf, offset)?;
        buf.truncate(got);

        self.codec.decode(&buf)
    }

    /// Returns the timestamp of the most recent sample, or `None` while
    /// the journal is empty.
    pub fn last(&self) -> Option<i64> {
        if self.points == 0 {
            None
        } else {
            Some(self.header.epoch + self.header.interval * (self.points as i64 - 1))
        }
    }

    /// Returns the timestamp of slot 0. A value of `0` means the journal
    /// holds no samples yet.
    pub fn epoch(&self) -> i64 {
        self.header.epoch
    }

    /// Returns the sample width in bytes.
    pub fn width(&self) -> i32 {
        self.header.width
    }

    /// Returns the number of time units between adjacent slots.
    pub fn interval(&self) -> i64 {
        self.header.interval
    }

    /// Returns the four metadata slots stored in the header.
    pub fn meta(&self) -> [i64; MAX_META] {
        self.header.meta
    }

    /// Returns the codec bound to this journal.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Returns the number of samples currently stored.
    pub fn len(&self) -> u64 {
        self.points
    }

    /// Returns true if the journal holds no samples.
    pub fn is_empty(&self) -> bool {
        self.points == 0
    }

    /// Returns true if the journal was opened read-only.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Returns the journal's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes file contents to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Releases the file lock and closes the descriptor.
    ///
    /// Consuming the handle makes any later operation a compile error;
    /// dropping a journal without calling `close` releases the lock the
    /// same way when the descriptor closes.
    pub fn close(self) -> Result<()> {
        lock::release(&self.file)?;
        Ok(())
    }
}

/// Reads at `offset` until the buffer is full or end of file, retrying
/// short reads. Returns the number of bytes read.
fn read_full_at(file: &File, buf: &mut [u8], offset: u64) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read_at(&mut buf[filled..], offset + filled as u64) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}
