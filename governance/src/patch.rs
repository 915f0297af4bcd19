//! Patch dry-run: RFC 6902 JSON patch and merge patch.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("invalid JSON pointer {0:?}")]
    InvalidPointer(String),
    #[error("operation {index}: {reason}")]
    MalformedOperation { index: usize, reason: String },
    #[error("operation {index}: unknown op {op:?}")]
    UnknownOperation { index: usize, op: String },
    #[error("path {0} does not exist")]
    MissingPath(String),
    #[error("invalid array index in {0}")]
    InvalidIndex(String),
    #[error("cannot move {from} into its own child {path}")]
    MoveIntoChild { from: String, path: String },
    #[error("test failed at {0}")]
    TestFailed(String),
}

/// Split a JSON pointer into unescaped reference tokens.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(pointer.to_owned()));
    };
    rest.split('/').map(|token| unescape(token, pointer)).collect()
}

fn unescape(token: &str, pointer: &str) -> Result<String, PatchError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return Err(PatchError::InvalidPointer(pointer.to_owned())),
        }
    }
    Ok(out)
}

/// Apply `ops` to a copy of `base`. The first failing op aborts the whole patch.
pub fn apply_json_patch(base: &Value, ops: &[Value]) -> Result<Value, PatchError> {
    let mut doc = base.clone();
    for (index, op) in ops.iter().enumerate() {
        apply_op(&mut doc, index, op)?;
    }
    Ok(doc)
}

fn apply_op(doc: &mut Value, index: usize, op: &Value) -> Result<(), PatchError> {
    let malformed = |reason: &str| PatchError::MalformedOperation {
        index,
        reason: reason.to_owned(),
    };
    let name = op
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing op"))?;
    let path = op
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing path"))?;
    let value = || op.get("value").cloned().ok_or_else(|| malformed("missing value"));
    let from = || {
        op.get("from")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing from"))
    };

    match name {
        "add" => add(doc, path, value()?),
        "remove" => remove(doc, path).map(drop),
        "replace" => {
            let target = lookup_mut(doc, path)?;
            *target = value()?;
            Ok(())
        }
        "move" => {
            let from = from()?;
            if from == path {
                return Ok(());
            }
            if path.starts_with(from) && path[from.len()..].starts_with('/') {
                return Err(PatchError::MoveIntoChild {
                    from: from.to_owned(),
                    path: path.to_owned(),
                });
            }
            let moved = remove(doc, from)?;
            add(doc, path, moved)
        }
        "copy" => {
            let copied = lookup(doc, from()?)?.clone();
            add(doc, path, copied)
        }
        "test" => {
            if *lookup(doc, path)? == value()? {
                Ok(())
            } else {
                Err(PatchError::TestFailed(path.to_owned()))
            }
        }
        other => Err(PatchError::UnknownOperation {
            index,
            op: other.to_owned(),
        }),
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Result<&'a Value, PatchError> {
    let tokens = parse_pointer(path)?;
    let mut current = doc;
    for token in &tokens {
        current = match current {
            Value::Object(map) => map.get(token),
            Value::Array(items) => array_index(token, items.len(), path)
                .ok()
                .and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| PatchError::MissingPath(path.to_owned()))?;
    }
    Ok(current)
}

fn lookup_mut<'a>(doc: &'a mut Value, path: &str) -> Result<&'a mut Value, PatchError> {
    let tokens = parse_pointer(path)?;
    walk_mut(doc, &tokens, path)
}

fn walk_mut<'a>(
    doc: &'a mut Value,
    tokens: &[String],
    path: &str,
) -> Result<&'a mut Value, PatchError> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map.get_mut(token),
            Value::Array(items) => {
                let len = items.len();
                array_index(token, len, path)
                    .ok()
                    .and_then(move |i| items.get_mut(i))
            }
            _ => None,
        }
        .ok_or_else(|| PatchError::MissingPath(path.to_owned()))?;
    }
    Ok(current)
}

/// Split off the last token and resolve its parent container.
fn parent_mut<'a>(
    doc: &'a mut Value,
    path: &str,
) -> Result<(&'a mut Value, String), PatchError> {
    let mut tokens = parse_pointer(path)?;
    let Some(last) = tokens.pop() else {
        return Err(PatchError::InvalidPointer(path.to_owned()));
    };
    let parent = walk_mut(doc, &tokens, path)?;
    Ok((parent, last))
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent, last) = parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            map.insert(last, value);
            Ok(())
        }
        Value::Array(items) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let i = array_index(&last, items.len() + 1, path)?;
            items.insert(i, value);
            Ok(())
        }
        _ => Err(PatchError::MissingPath(path.to_owned())),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<Value, PatchError> {
    let (parent, last) = parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => map
            .remove(&last)
            .ok_or_else(|| PatchError::MissingPath(path.to_owned())),
        Value::Array(items) => {
            let i = array_index(&last, items.len(), path)?;
            Ok(items.remove(i))
        }
        _ => Err(PatchError::MissingPath(path.to_owned())),
    }
}

/// Parse an array index token that must be `< bound`. Leading zeros are rejected.
fn array_index(token: &str, bound: usize, path: &str) -> Result<usize, PatchError> {
    let invalid = || PatchError::InvalidIndex(path.to_owned());
    if token.is_empty()
        || !token.bytes().all(|b| b.is_ascii_digit())
        || (token.len() > 1 && token.starts_with('0'))
    {
        return Err(invalid());
    }
    let i: usize = token.parse().map_err(|_| invalid())?;
    if i < bound { Ok(i) } else { Err(invalid()) }
}

/// Merge `patch` into a copy of `base`.
///
/// `null` deletes a key, an object merged onto an object recurses, anything
/// else replaces the value outright.
#[must_use]
pub fn apply_merge_patch(base: &Value, patch: &Map<String, Value>) -> Value {
    let mut result = base.clone();
    if let Value::Object(target) = &mut result {
        merge_into(target, patch);
    }
    result
}

fn merge_into(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(key);
            }
            Value::Object(inner) => {
                if let Some(Value::Object(existing)) = target.get_mut(key) {
                    merge_into(existing, inner);
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
