//! Shared infrastructure utilities for VaultMesh.
//!
//! This crate provides cross-cutting utilities that multiple VaultMesh crates need
//! but that don't belong in the domain-pure `vaultmesh-types` crate:
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`file_lock`**: Exclusive advisory locks with a no-op fallback

pub mod atomic_write;
pub mod file_lock;

pub use atomic_write::{
    AtomicWriteOptions, FileSyncPolicy, ParentDirSyncPolicy, atomic_write,
    atomic_write_with_options, recover_bak_file, write_json_pretty,
};
#[cfg(unix)]
pub use file_lock::FlockLocker;
pub use file_lock::{FileLocker, LockGuard, NoopLocker, platform_locker};
