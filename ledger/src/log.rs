//! The append path: lock the shard, dedup, write, fsync, update the sidecar index.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use vaultmesh_utils::{FileLocker, LockGuard, platform_locker};

use crate::error::LedgerError;
use crate::event::{LedgerEvent, ShardDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// An event with the same `event_id` is already in the shard. Nothing was written.
    Duplicate,
}

/// Acknowledgement of one [`LedgerLog::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub outcome: AppendOutcome,
    pub shard: PathBuf,
    pub event_id: Option<Value>,
}

impl Ack {
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.outcome == AppendOutcome::Duplicate
    }
}

/// Append-only event store, one `events-YYYY-MM-DD.jsonl` shard per UTC day.
#[derive(Debug, Clone)]
pub struct LedgerLog {
    root: PathBuf,
    compact: bool,
    locker: Arc<dyn FileLocker>,
}

impl LedgerLog {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compact: false,
            locker: platform_locker(),
        }
    }

    /// Strip events to the compact allow-list before writing.
    #[must_use]
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    #[must_use]
    pub fn with_locker(mut self, locker: Arc<dyn FileLocker>) -> Self {
        self.locker = locker;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn is_compact(&self) -> bool {
        self.compact
    }

    #[must_use]
    pub fn shard_path(&self, day: ShardDay) -> PathBuf {
        self.root.join(day.shard_file_name())
    }

    #[must_use]
    pub fn index_path(&self, day: ShardDay) -> PathBuf {
        self.root.join(day.index_file_name())
    }

    pub fn append(&self, event: LedgerEvent) -> Result<Ack, LedgerError> {
        self.append_at(event, Utc::now())
    }

    /// Append with an explicit clock for events that carry no `ts`.
    pub fn append_at(
        &self,
        mut event: LedgerEvent,
        now: DateTime<Utc>,
    ) -> Result<Ack, LedgerError> {
        event.ensure_ts(now);
        if self.compact {
            event = event.compacted();
        }
        let day = event.shard_day()?;
        let shard = self.shard_path(day);
        let index = self.index_path(day);
        let event_id = event.event_id().cloned();

        fs::create_dir_all(&self.root).map_err(LedgerError::io(&self.root))?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&shard)
            .map_err(LedgerError::io(&shard))?;

        let _guard = LockGuard::acquire(self.locker.as_ref(), &file)
            .map_err(LedgerError::io(&shard))?;

        if let Some(id) = event_id.as_ref()
            && (index_contains(&index, id)
                || shard_contains(&file, id).map_err(LedgerError::io(&shard))?)
        {
            tracing::info!(shard = %shard.display(), event_id = %id, "Skipped duplicate ledger event");
            return Ok(Ack {
                outcome: AppendOutcome::Duplicate,
                shard,
                event_id,
            });
        }

        write_durable(&file, event.to_line().as_bytes()).map_err(LedgerError::io(&shard))?;

        if let Some(id) = event_id.as_ref()
            && let Err(e) = append_index(&index, id)
        {
            // The shard rescan still catches this id next time.
            tracing::warn!(index = %index.display(), "Failed to update ledger index: {e}");
        }

        tracing::info!(
            shard = %shard.display(),
            event_id = %event_id.as_ref().unwrap_or(&serde_json::Value::Null),
            "Appended ledger event"
        );
        Ok(Ack {
            outcome: AppendOutcome::Appended,
            shard,
            event_id,
        })
    }

    /// The last `limit` well-formed events of `day`'s shard, oldest first.
    ///
    /// Lines that are not JSON objects are skipped. A missing shard is empty.
    pub fn recent(&self, day: ShardDay, limit: usize) -> Result<Vec<LedgerEvent>, LedgerError> {
        let shard = self.shard_path(day);
        let file = match File::open(&shard) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LedgerError::Io { path: shard, source: e }),
        };

        let mut events = Vec::new();
        for line in BufReader::new(file).split(b'\n') {
            let line = line.map_err(LedgerError::io(&shard))?;
            match serde_json::from_slice::<Value>(&line)
                .ok()
                .map(LedgerEvent::from_value)
            {
                Some(Ok(event)) => events.push(event),
                _ => tracing::debug!(shard = %shard.display(), "Skipping malformed ledger line"),
            }
        }
        let skip = events.len().saturating_sub(limit);
        Ok(events.split_off(skip))
    }
}

/// Sidecar lookup. An unreadable index is treated as empty; the shard rescan covers it.
///
/// Each line holds one id as a JSON literal, so ids with line breaks stay on one line
/// and a numeric id never matches its string spelling.
fn index_contains(index: &Path, id: &Value) -> bool {
    let file = match File::open(index) {
        Ok(file) => file,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(index = %index.display(), "Ignoring unreadable ledger index: {e}");
            }
            return false;
        }
    };
    BufReader::new(file)
        .split(b'\n')
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_slice::<Value>(line.trim_ascii()).ok())
        .any(|stored| stored == *id)
}

/// Rescan every existing line of the shard for `id`.
fn shard_contains(mut file: &File, id: &Value) -> io::Result<bool> {
    file.seek(SeekFrom::Start(0))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents
        .split(|b| *b == b'\n')
        .filter_map(|line| serde_json::from_slice::<Value>(line).ok())
        .any(|value| value.get("event_id") == Some(id)))
}

/// Write one line and force it to disk before the lock is released.
fn write_durable(file: &File, line: &[u8]) -> io::Result<()> {
    let mut writer = file;
    writer.write_all(line)?;
    writer.flush()?;
    file.sync_all()
}

fn append_index(index: &Path, id: &Value) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(index)?;
    writeln!(file, "{id}")
}
