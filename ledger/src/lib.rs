//! Append-only operational ledger.
//!
//! Each event goes to the shard for the UTC day of its own `ts`
//! (`events-YYYY-MM-DD.jsonl`), next to a sidecar `events-YYYY-MM-DD.idx`
//! listing every `event_id` already written there. Appends hold an exclusive
//! advisory lock on the shard for the whole check-write-fsync section.
//!
//! Dedup checks the sidecar index and then rescans the shard itself, so a
//! lost or stale index never lets a duplicate through. Events without an
//! `event_id` are always appended.

#![allow(clippy::missing_errors_doc)]

mod error;
mod event;
mod log;

pub use error::LedgerError;
pub use event::{COMPACT_FIELDS, LedgerEvent, ShardDay};
pub use log::{Ack, AppendOutcome, LedgerLog};
