//! # DOI Search
//!
//! Look up a list of DOIs in OpenAlex and summarize what comes back:
//! open-access status, journals, authors and their institutions.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Flattened work records, merged rows and run reports
//! - [`sources`]: The [`WorksSource`] trait and the OpenAlex client
//! - [`pipeline`]: Normalize, batch, fetch, merge and summarize
//! - [`input`]: Reading DOI lists from CSV and text files
//! - [`utils`]: Normalization, batching, flattening, HTTP and display helpers
//! - [`config`]: Configuration management
//! - [`ui`]: Status output and progress bars for the CLI

pub mod config;
pub mod input;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{MergedRow, RunOutcome, RunReport};
pub use pipeline::{FetchOptions, Pipeline, RunRequest, RunSummary};
pub use sources::{OpenAlexSource, SourceError, WorksSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
