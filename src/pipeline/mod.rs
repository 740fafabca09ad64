//! The DOI lookup pipeline.
//!
//! Normalize → batch → fetch (bounded fan-out) → merge (fan-in) → summarize.
//!
//! ```rust,no_run
//! use doi_search::pipeline::{FetchOptions, Pipeline, RunRequest};
//! use doi_search::sources::OpenAlexSource;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = OpenAlexSource::new(None, Duration::from_secs(30))?;
//! let pipeline = Pipeline::new(Arc::new(source), FetchOptions::default());
//!
//! let request = RunRequest::from_text("10.1136/bmjgh-2023-013696\n10.1097/jac.0b013e31822cbdfd");
//! let report = pipeline.run(&request).await?;
//! println!("{} of {} DOIs found", report.matched(), report.rows.len());
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod fetch;
mod summary;

pub use aggregate::{
    affiliation_table, author_table, explode_authorships, explode_institutions, merge,
};
pub use fetch::{fetch_batches, BatchOutcome, DEFAULT_MAX_CONCURRENT};
pub use summary::{
    oa_label, oa_sentence, summarize_affiliations, summarize_rows, value_counts, SummaryField,
};

use serde::Serialize;
use std::sync::Arc;

use crate::models::{AffiliationRow, AuthorRow, RunReport, SummaryTable};
use crate::sources::WorksSource;
use crate::utils::{
    batch_count, normalize_dois, split_lines, BatchSize, InputError, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_DOIS,
};

/// Errors that stop a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Tuning for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// DOIs per upstream request
    pub batch_size: BatchSize,

    /// Cap on in-flight requests
    pub max_concurrent: usize,

    /// Cap on unique DOIs per run
    pub max_dois: usize,

    /// Nesting depth followed when flattening works
    pub max_depth: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            batch_size: BatchSize::default(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_dois: DEFAULT_MAX_DOIS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The DOIs submitted for one run, as typed or uploaded.
///
/// Runs share no state; everything a run needs travels in this value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub submitted: Vec<String>,
}

impl RunRequest {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            submitted: values.into_iter().map(Into::into).collect(),
        }
    }

    /// One DOI per line
    pub fn from_text(text: &str) -> Self {
        Self::new(split_lines(text))
    }
}

/// Runs DOI lookups against a [`WorksSource`]
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: Arc<dyn WorksSource>,
    options: FetchOptions,
}

impl Pipeline {
    pub fn new(source: Arc<dyn WorksSource>, options: FetchOptions) -> Self {
        Self { source, options }
    }

    /// Normalize the submitted values without touching the network.
    ///
    /// Fails when nothing usable was submitted or the cap is exceeded.
    pub fn prepare(&self, request: &RunRequest) -> Result<Vec<String>, InputError> {
        let dois = normalize_dois(&request.submitted, self.options.max_dois)?;
        if dois.is_empty() {
            return Err(InputError::NoDois);
        }
        Ok(dois)
    }

    /// Number of upstream requests a list of `n` DOIs needs
    pub fn batches_for(&self, n: usize) -> usize {
        batch_count(n, self.options.batch_size)
    }

    /// Run the whole pipeline
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, PipelineError> {
        self.run_with_progress(request, |_| {}).await
    }

    /// Run the whole pipeline, calling `on_batch_done` as each batch completes
    pub async fn run_with_progress<F>(
        &self,
        request: &RunRequest,
        on_batch_done: F,
    ) -> Result<RunReport, PipelineError>
    where
        F: FnMut(&BatchOutcome),
    {
        let dois = self.prepare(request)?;
        Ok(self.lookup(&dois, on_batch_done).await)
    }

    /// Fetch and merge already-normalized DOIs
    pub async fn lookup<F>(&self, dois: &[String], on_batch_done: F) -> RunReport
    where
        F: FnMut(&BatchOutcome),
    {
        let outcomes = fetch_batches(
            self.source.as_ref(),
            dois,
            self.options.batch_size,
            self.options.max_concurrent,
            on_batch_done,
        )
        .await;

        let failed_batches: Vec<_> = outcomes.iter().filter_map(BatchOutcome::failure).collect();
        let rows = merge(
            dois,
            outcomes.iter().flat_map(BatchOutcome::works),
            self.options.max_depth,
        );

        let report = RunReport {
            rows,
            total_batches: outcomes.len(),
            failed_batches,
        };

        tracing::info!(
            submitted = dois.len(),
            matched = report.matched(),
            failed_batches = report.failed_batches.len(),
            "Lookup complete"
        );
        report
    }
}

/// All tables derived from one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub oa_status: SummaryTable,
    pub is_oa: SummaryTable,
    pub journals: SummaryTable,
    pub institutions: SummaryTable,
    pub countries: SummaryTable,

    /// Distinct authors
    pub authors: Vec<AuthorRow>,

    /// Distinct author-institution pairs
    pub affiliations: Vec<AffiliationRow>,
}

impl RunSummary {
    pub fn from_report(report: &RunReport) -> Self {
        let exploded = explode_authorships(&report.rows);
        let affiliations = affiliation_table(&explode_institutions(&exploded));
        let authors = author_table(&exploded);

        Self {
            oa_status: summarize_rows(&report.rows, SummaryField::OaStatus),
            is_oa: summarize_rows(&report.rows, SummaryField::IsOa),
            journals: summarize_rows(&report.rows, SummaryField::Journal),
            institutions: summarize_affiliations(&affiliations, SummaryField::Institution),
            countries: summarize_affiliations(&affiliations, SummaryField::Country),
            authors,
            affiliations,
        }
    }

    /// The table for one field
    pub fn table(&self, field: SummaryField) -> &SummaryTable {
        match field {
            SummaryField::OaStatus => &self.oa_status,
            SummaryField::IsOa => &self.is_oa,
            SummaryField::Journal => &self.journals,
            SummaryField::Institution => &self.institutions,
            SummaryField::Country => &self.countries,
        }
    }
}

/// Build the summary table for one field of a report
pub fn summarize(report: &RunReport, field: SummaryField) -> SummaryTable {
    if field.is_affiliation_field() {
        let affiliations =
            affiliation_table(&explode_institutions(&explode_authorships(&report.rows)));
        summarize_affiliations(&affiliations, field)
    } else {
        summarize_rows(&report.rows, field)
    }
}
