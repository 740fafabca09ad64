//! Upstream sources of work records.
//!
//! The pipeline talks to OpenAlex through the [`WorksSource`] trait so that
//! tests (and alternative mirrors) can stand in for the real service.

pub mod mock;
mod openalex;

pub use mock::MockSource;
pub use openalex::{OpenAlexSource, OPENALEX_API_BASE};

use async_trait::async_trait;
use serde_json::Value;

/// A service that resolves batches of DOIs into work records
#[async_trait]
pub trait WorksSource: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs
    fn id(&self) -> &str;

    /// Fetch the raw work records matching any DOI in `dois`.
    ///
    /// One call is one upstream request. The records come back in whatever
    /// order the service returns them; unmatched DOIs are simply absent.
    async fn works_by_dois(&self, dois: &[String]) -> Result<Vec<Value>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport failure, including timeouts
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// The response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
