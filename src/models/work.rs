//! Work records as returned by OpenAlex and the rows derived from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Dotted-path keys of the upstream fields the tool reads
pub mod fields {
    pub const ID: &str = "id";
    pub const DOI: &str = "doi";
    pub const TITLE: &str = "title";
    pub const PUBLICATION_YEAR: &str = "publication_year";
    pub const OA_STATUS: &str = "open_access.oa_status";
    pub const IS_OA: &str = "open_access.is_oa";
    pub const JOURNAL: &str = "primary_location.source.display_name";
    pub const AUTHORSHIPS: &str = "authorships";
}

/// A work flattened into `dotted.path -> value` entries.
///
/// Arrays (such as `authorships`) stay whole; see [`crate::utils::flatten`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord(BTreeMap<String, Value>);

impl FlatRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under a dotted path
    pub fn insert(&mut self, path: impl Into<String>, value: Value) {
        self.0.insert(path.into(), value);
    }

    /// Look up a path. Missing paths and JSON nulls both read as `None`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path).filter(|v| !v.is_null())
    }

    /// Look up a path as a string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Look up a path as a boolean
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Look up a path as an array; anything else reads as empty
    pub fn get_array(&self, path: &str) -> &[Value] {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the path is present at all (even if null)
    pub fn contains_key(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Iterate over all keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One submitted DOI, left-joined with its matching work (if any)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    /// The normalized DOI as submitted
    pub doi: String,

    /// The flattened upstream record, `None` when OpenAlex had no match
    pub work: Option<FlatRecord>,
}

impl MergedRow {
    /// Create an unmatched row
    pub fn unmatched(doi: impl Into<String>) -> Self {
        Self {
            doi: doi.into(),
            work: None,
        }
    }

    /// Create a matched row
    pub fn matched(doi: impl Into<String>, work: FlatRecord) -> Self {
        Self {
            doi: doi.into(),
            work: Some(work),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.work.is_some()
    }

    /// Read a flattened field; unmatched rows read as `None` everywhere
    pub fn field(&self, path: &str) -> Option<&Value> {
        self.work.as_ref().and_then(|w| w.get(path))
    }

    /// Read a flattened field rendered as text.
    ///
    /// Strings are returned as-is, other scalars via their JSON form.
    pub fn text(&self, path: &str) -> Option<String> {
        self.field(path).and_then(value_to_text)
    }
}

/// Render a scalar JSON value as a display string
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// One authorship entry of a matched work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorRow {
    /// DOI of the work this authorship belongs to
    pub doi: String,
    pub display_name: Option<String>,
    pub orcid: Option<String>,
    pub author_position: Option<String>,
    pub is_corresponding: Option<bool>,
    pub raw_author_name: Option<String>,
    /// Institutions as returned upstream, exploded by
    /// [`crate::pipeline::explode_institutions`]
    #[serde(skip)]
    pub institutions: Vec<InstitutionValue>,
}

/// Raw institution entry kept on an [`AuthorRow`] until it is exploded
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstitutionValue {
    pub display_name: Option<String>,
    pub country_code: Option<String>,
    pub institution_type: Option<String>,
}

/// One author-institution pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AffiliationRow {
    pub doi: String,
    pub author: Option<String>,
    pub institution: Option<String>,
    pub country_code: Option<String>,
    #[serde(rename = "type")]
    pub institution_type: Option<String>,
}
