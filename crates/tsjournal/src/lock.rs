//! Advisory whole-file locking for journal descriptors.
//!
//! Thin wrappers over `flock(2)` via [`fs2::FileExt`]. Locks are
//! cooperative: processes that bypass them can still corrupt the file.
//! The journal engine takes an exclusive lock for the open lifetime of a
//! writable journal and a shared lock for a read-only one; the lock is
//! released when the descriptor closes.

use crate::error::{JournalError, Result};
use fs2::FileExt;
use std::fs::File;
use std::io;

// Calls are trait-qualified: newer standard libraries grew inherent
// `File::lock_shared`/`try_lock_shared`/`unlock` methods with different
// signatures that would otherwise shadow the fs2 versions.

/// Blocks until an exclusive lock on the whole file is acquired.
pub fn exclusive(file: &File) -> Result<()> {
    FileExt::lock_exclusive(file)?;
    Ok(())
}

/// Blocks until a shared lock on the whole file is acquired.
pub fn shared(file: &File) -> Result<()> {
    FileExt::lock_shared(file)?;
    Ok(())
}

/// Attempts an exclusive lock without blocking.
///
/// Returns [`JournalError::LockBusy`] if another holder has the lock.
pub fn try_exclusive(file: &File) -> Result<()> {
    FileExt::try_lock_exclusive(file).map_err(busy)
}

/// Attempts a shared lock without blocking.
///
/// Returns [`JournalError::LockBusy`] if an exclusive holder has the lock.
pub fn try_shared(file: &File) -> Result<()> {
    FileExt::try_lock_shared(file).map_err(busy)
}

/// Releases any lock held on the file.
pub fn release(file: &File) -> Result<()> {
    FileExt::unlock(file)?;
    Ok(())
}

/// Maps flock contention (EWOULDBLOCK/EAGAIN) to `LockBusy`; anything
/// else is a plain I/O failure.
fn busy(err: io::Error) -> JournalError {
    if err.kind() == io::ErrorKind::WouldBlock {
        JournalError::LockBusy
    } else {
        JournalError::Io(err)
    }
}
