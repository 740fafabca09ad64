//! Dotted-path flattening of JSON documents.
//!
//! ```
//! use doi_search::utils::flatten;
//! use serde_json::json;
//!
//! let work = json!({"open_access": {"oa_status": "gold", "is_oa": true}});
//! let flat = flatten(&work, 6);
//! assert_eq!(flat.get_str("open_access.oa_status"), Some("gold"));
//! ```

use serde_json::Value;

use crate::models::FlatRecord;

/// Default nesting depth followed before an object is kept whole
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Flatten a JSON value into `dotted.path -> value` entries.
///
/// Objects are walked recursively. Arrays, scalars and nulls are leaves, as
/// is any object found deeper than `max_depth` levels. A non-object root is
/// stored under the empty key.
pub fn flatten(value: &Value, max_depth: usize) -> FlatRecord {
    let mut out = FlatRecord::new();
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                walk(child, key.clone(), 1, max_depth, &mut out);
            }
        }
        other => out.insert(String::new(), other.clone()),
    }
    out
}

fn walk(value: &Value, path: String, depth: usize, max_depth: usize, out: &mut FlatRecord) {
    match value {
        Value::Object(map) if depth < max_depth && !map.is_empty() => {
            for (key, child) in map {
                walk(child, format!("{path}.{key}"), depth + 1, max_depth, out);
            }
        }
        leaf => out.insert(path, leaf.clone()),
    }
}
