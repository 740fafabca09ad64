//! Utility modules supporting the lookup pipeline.
//!
//! - [`normalize_dois`]: Trim, strip resolver prefixes and deduplicate submitted DOIs
//! - [`batches`]: Split DOIs into request-sized batches
//! - [`flatten`]: Depth-bounded dotted-path flattening of JSON documents
//! - [`HttpClient`]: HTTP client with timeouts
//! - [`render_summary`]: Terminal rendering of summary tables
//!
//! # Normalization
//!
//! ```rust
//! use doi_search::utils::{normalize_dois, DEFAULT_MAX_DOIS};
//!
//! let dois = normalize_dois(
//!     ["10.1136/bmjgh-2023-013696", "https://doi.org/10.1136/bmjgh-2023-013696", ""],
//!     DEFAULT_MAX_DOIS,
//! )
//! .unwrap();
//! assert_eq!(dois, vec!["10.1136/bmjgh-2023-013696"]);
//! ```
//!
//! # Batching
//!
//! ```rust
//! use doi_search::utils::{batches, BatchSize};
//!
//! let dois: Vec<String> = (0..25).map(|i| format!("10.1/{i}")).collect();
//! let sizes: Vec<usize> = batches(&dois, BatchSize::new(20)).map(|b| b.len()).collect();
//! assert_eq!(sizes, vec![20, 5]);
//! ```

mod batch;
mod display;
mod flatten;
mod http;
mod normalize;

pub use batch::{batch_count, batches, BatchSize, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
pub use display::{
    is_terminal, label_width, render_affiliations, render_authors, render_rows, render_summary,
    terminal_width, truncate_with_ellipsis, MISSING_LABEL,
};
pub use flatten::{flatten, DEFAULT_MAX_DEPTH};
pub use http::{
    default_user_agent, HttpClient, HttpClientBuilder, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_TIMEOUT_SECS,
};
pub use normalize::{
    normalize_doi, normalize_dois, split_lines, strip_doi_prefix, InputError, DEFAULT_MAX_DOIS,
    DOI_PREFIXES,
};
