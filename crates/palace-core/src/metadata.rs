//! Metadata engine -- pure operations over a shard's JSON metadata (§4.3).

use serde_json::{Map, Value};

/// Per-shard metadata size cap: 1 MB serialized.
pub const MAX_METADATA_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("path not found")]
    PathNotFound,

    #[error("metadata exceeds {MAX_METADATA_BYTES} byte cap")]
    TooLarge,

    #[error("metadata root must be a JSON object")]
    NotAnObject,
}

/// Returns the value at `path`, a sequence of object keys. An empty path
/// returns the whole object. Missing path is [`MetadataError::PathNotFound`].
pub fn get_path<'a>(metadata: &'a Value, path: &[&str]) -> Result<&'a Value, MetadataError> {
    let mut cur = metadata;
    for key in path {
        cur = cur.get(key).ok_or(MetadataError::PathNotFound)?;
    }
    Ok(cur)
}

/// Top-level key merge: keys in `patch` overwrite keys in `metadata`, others untouched.
pub fn merge(metadata: &Value, patch: &Value) -> Result<Value, MetadataError> {
    let base = metadata.as_object().ok_or(MetadataError::NotAnObject)?;
    let patch = patch.as_object().ok_or(MetadataError::NotAnObject)?;
    let mut out = base.clone();
    for (k, v) in patch {
        out.insert(k.clone(), v.clone());
    }
    check_size(&Value::Object(out.clone()))?;
    Ok(Value::Object(out))
}

/// Deep-set at `path`, creating intermediate objects as needed.
pub fn set_path(metadata: &Value, path: &[&str], value: Value) -> Result<Value, MetadataError> {
    let mut root = metadata.as_object().cloned().ok_or(MetadataError::NotAnObject)?;
    let Some((last, init)) = path.split_last() else {
        check_size(&Value::Object(root.clone()))?;
        return Ok(Value::Object(root));
    };

    let mut cur = &mut root;
    for key in init {
        let entry = cur
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        cur = entry.as_object_mut().expect("just normalized to object");
    }
    cur.insert(last.to_string(), value);

    let out = Value::Object(root);
    check_size(&out)?;
    Ok(out)
}

/// Top-level key deletion; missing key is a no-op.
pub fn delete_key(metadata: &Value, key: &str) -> Result<Value, MetadataError> {
    let mut root = metadata.as_object().cloned().ok_or(MetadataError::NotAnObject)?;
    root.remove(key);
    Ok(Value::Object(root))
}

/// Containment match: every key/value pair in `pattern` must be present
/// (recursively, for nested objects) and equal in `metadata`.
pub fn query_contains(metadata: &Value, pattern: &Value) -> bool {
    match (metadata, pattern) {
        (Value::Object(m), Value::Object(p)) => p.iter().all(|(k, pv)| {
            m.get(k).is_some_and(|mv| query_contains(mv, pv))
        }),
        _ => metadata == pattern,
    }
}

fn check_size(metadata: &Value) -> Result<(), MetadataError> {
    let size = serde_json::to_vec(metadata).map(|b| b.len()).unwrap_or(usize::MAX);
    if size > MAX_METADATA_BYTES {
        return Err(MetadataError::TooLarge);
    }
    Ok(())
}
