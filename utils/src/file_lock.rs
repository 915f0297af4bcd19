//! Cooperative cross-process file locking.
//!
//! Ledger shards are shared between independent writer processes. Writers take
//! an exclusive advisory lock on the shard file for the whole
//! read-for-dedup → write → fsync critical section.
//!
//! # Known gap
//!
//! Advisory locks only bind cooperating writers. On platforms without `flock`
//! the [`NoopLocker`] is used instead: appends still succeed, but two
//! concurrent writers to the same shard can interleave their dedup checks and
//! both append the same `event_id`. [`FileLocker::is_enforced`] reports which
//! case applies so callers can surface it.

use std::fmt;
use std::fs::File;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Capability to take and drop an exclusive lock on an open file.
pub trait FileLocker: Send + Sync + fmt::Debug {
    /// Block until the exclusive lock is held.
    fn acquire(&self, file: &File) -> io::Result<()>;

    fn release(&self, file: &File) -> io::Result<()>;

    /// `false` when this locker does not actually exclude other writers.
    fn is_enforced(&self) -> bool;
}

/// `flock(2)`-based locker.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FlockLocker;

#[cfg(unix)]
impl FlockLocker {
    fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
        use std::os::fd::AsRawFd;

        let fd = file.as_raw_fd();
        loop {
            // SAFETY: `fd` is a valid open descriptor borrowed from `file` for
            // the duration of the call.
            let rc = unsafe { libc::flock(fd, operation) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            // A signal interrupted the wait; the lock is not held yet.
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

#[cfg(unix)]
impl FileLocker for FlockLocker {
    fn acquire(&self, file: &File) -> io::Result<()> {
        Self::flock(file, libc::LOCK_EX)
    }

    fn release(&self, file: &File) -> io::Result<()> {
        Self::flock(file, libc::LOCK_UN)
    }

    fn is_enforced(&self) -> bool {
        true
    }
}

/// Locker for platforms without advisory locks. Never blocks, never excludes.
#[derive(Debug, Default)]
pub struct NoopLocker {
    warned: AtomicBool,
}

impl FileLocker for NoopLocker {
    fn acquire(&self, _file: &File) -> io::Result<()> {
        if !self.warned.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "Advisory file locks unavailable; concurrent writers to one shard are not serialized"
            );
        }
        Ok(())
    }

    fn release(&self, _file: &File) -> io::Result<()> {
        Ok(())
    }

    fn is_enforced(&self) -> bool {
        false
    }
}

/// The best locker this platform supports.
#[must_use]
pub fn platform_locker() -> Arc<dyn FileLocker> {
    #[cfg(unix)]
    {
        Arc::new(FlockLocker)
    }
    #[cfg(not(unix))]
    {
        Arc::new(NoopLocker::default())
    }
}

/// Holds a lock for its lifetime and releases it on drop.
#[derive(Debug)]
pub struct LockGuard<'a> {
    file: &'a File,
    locker: &'a dyn FileLocker,
}

impl<'a> LockGuard<'a> {
    pub fn acquire(locker: &'a dyn FileLocker, file: &'a File) -> io::Result<Self> {
        locker.acquire(file)?;
        Ok(Self { file, locker })
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.locker.release(self.file) {
            // Closing the descriptor drops the lock anyway.
            tracing::warn!("Failed to release file lock: {e}");
        }
    }
}
