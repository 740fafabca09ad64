//! Mock source for testing purposes.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::sources::{SourceError, WorksSource};

/// A mock source that serves a fixed set of works and can be told to fail
/// any request that contains a particular DOI.
#[derive(Debug, Default)]
pub struct MockSource {
    works: Mutex<Vec<Value>>,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a new mock source with no works.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source serving the given works.
    pub fn with_works(works: Vec<Value>) -> Self {
        Self {
            works: Mutex::new(works),
            ..Self::default()
        }
    }

    /// Fail every request whose batch contains `doi`.
    pub fn fail_on(&self, doi: &str) {
        let mut guard = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(doi.to_string());
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorksSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    async fn works_by_dois(&self, dois: &[String]) -> Result<Vec<Value>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        {
            let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
            if dois.iter().any(|d| failing.contains(d)) {
                return Err(SourceError::Api(
                    "OpenAlex API returned status: 500 Internal Server Error".to_string(),
                ));
            }
        }

        let wanted: HashSet<String> = dois.iter().map(|d| d.to_lowercase()).collect();
        let works = self.works.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(works
            .iter()
            .filter(|w| {
                w.get("doi")
                    .and_then(Value::as_str)
                    .map(|d| wanted.contains(&crate::utils::strip_doi_prefix(d).to_lowercase()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

/// Helper function to create a mock work for testing.
pub fn make_work(doi: &str, oa_status: &str, is_oa: bool, journal: Option<&str>) -> Value {
    serde_json::json!({
        "id": format!("https://openalex.org/W{}", doi.len()),
        "doi": format!("https://doi.org/{}", doi),
        "open_access": {"oa_status": oa_status, "is_oa": is_oa},
        "primary_location": journal.map(|name| serde_json::json!({"source": {"display_name": name}})),
        "authorships": []
    })
}
