//! Ledger events and the shard day they belong to.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::LedgerError;

/// Fields kept when compact mode is on. Everything else is dropped before write.
pub const COMPACT_FIELDS: &[&str] = &[
    "event_id",
    "ts",
    "keyword",
    "profile",
    "provider",
    "model",
    "run_level",
    "input_hash",
    "output_hash",
];

const DAY_FORMAT: &str = "%Y-%m-%d";
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One free-form operational record. Always a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEvent {
    fields: Map<String, Value>,
}

impl LedgerEvent {
    /// Parse a single JSON object. Blank input is the empty event.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        if raw.trim().is_empty() {
            return Ok(Self { fields: Map::new() });
        }
        let value: Value = serde_json::from_str(raw).map_err(|e| LedgerError::MalformedEvent {
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, LedgerError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(LedgerError::MalformedEvent {
                reason: format!("expected a JSON object, got {}", kind_of(&other)),
            }),
        }
    }

    /// The dedup key: a non-empty string, a number or a boolean.
    ///
    /// Null, empty strings, arrays and objects mean the event has no id.
    #[must_use]
    pub fn event_id(&self) -> Option<&Value> {
        self.fields.get("event_id").filter(|id| match id {
            Value::String(s) => !s.is_empty(),
            Value::Number(_) | Value::Bool(_) => true,
            Value::Null | Value::Array(_) | Value::Object(_) => false,
        })
    }

    #[must_use]
    pub fn ts(&self) -> Option<&Value> {
        self.fields.get("ts")
    }

    /// Stamp `now` into `ts` when it is missing, null or blank.
    pub fn ensure_ts(&mut self, now: DateTime<Utc>) {
        let missing = match self.fields.get("ts") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            let stamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);
            self.fields.insert("ts".to_owned(), Value::String(stamp));
        }
    }

    /// Drop every field outside [`COMPACT_FIELDS`], keeping order.
    #[must_use]
    pub fn compacted(mut self) -> Self {
        self.fields.retain(|key, _| COMPACT_FIELDS.contains(&key.as_str()));
        self
    }

    /// The UTC day of `ts`.
    pub fn shard_day(&self) -> Result<ShardDay, LedgerError> {
        match self.fields.get("ts") {
            Some(Value::String(ts)) => ShardDay::from_ts(ts),
            other => Err(LedgerError::InvalidTimestamp {
                ts: other.map(ToString::to_string).unwrap_or_default(),
            }),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// One newline-terminated JSON line.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line = Value::Object(self.fields.clone()).to_string();
        line.push('\n');
        line
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A UTC calendar day; names one shard and its sidecar index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardDay(NaiveDate);

impl ShardDay {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Resolve the day an event timestamp falls on, in UTC.
    ///
    /// Offsets are converted, naive date-times are taken as UTC, and as a last
    /// resort a leading `YYYY-MM-DD` is used as-is.
    pub fn from_ts(ts: &str) -> Result<Self, LedgerError> {
        let ts = ts.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
            return Ok(Self(dt.with_timezone(&Utc).date_naive()));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(ts, format) {
                return Ok(Self(naive.date()));
            }
        }
        ts.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, DAY_FORMAT).ok())
            .map(Self)
            .ok_or_else(|| LedgerError::InvalidTimestamp { ts: ts.to_owned() })
    }

    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn shard_file_name(self) -> String {
        format!("events-{self}.jsonl")
    }

    #[must_use]
    pub fn index_file_name(self) -> String {
        format!("events-{self}.idx")
    }
}

impl fmt::Display for ShardDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for ShardDay {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DAY_FORMAT).map(Self)
    }
}
