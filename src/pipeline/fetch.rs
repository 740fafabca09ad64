//! Concurrent batch fetching.

use futures_util::stream::{self, StreamExt};
use serde_json::Value;

use crate::models::BatchFailure;
use crate::sources::{SourceError, WorksSource};
use crate::utils::{batch_count, batches, BatchSize};

/// Default cap on in-flight upstream requests
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Result of one batch request
#[derive(Debug)]
pub struct BatchOutcome {
    /// Zero-based batch index
    pub index: usize,

    /// DOIs sent in this batch
    pub dois: Vec<String>,

    /// Works returned, or why the request failed
    pub result: Result<Vec<Value>, SourceError>,
}

impl BatchOutcome {
    /// Works of a successful batch; a failed batch yields none
    pub fn works(&self) -> &[Value] {
        match &self.result {
            Ok(works) => works,
            Err(_) => &[],
        }
    }

    /// Describe the failure, if any
    pub fn failure(&self) -> Option<BatchFailure> {
        self.result.as_ref().err().map(|e| BatchFailure {
            index: self.index,
            size: self.dois.len(),
            reason: e.to_string(),
        })
    }
}

/// Fetch every batch of `dois`, at most `max_concurrent` at a time.
///
/// Waits for all batches; a failed batch is logged and returned as such,
/// never retried. `on_batch_done` runs once per completed batch. Outcomes
/// are returned in batch order.
pub async fn fetch_batches<S, F>(
    source: &S,
    dois: &[String],
    batch_size: BatchSize,
    max_concurrent: usize,
    mut on_batch_done: F,
) -> Vec<BatchOutcome>
where
    S: WorksSource + ?Sized,
    F: FnMut(&BatchOutcome),
{
    let total = batch_count(dois.len(), batch_size);
    if total == 0 {
        return Vec::new();
    }
    let workers = max_concurrent.clamp(1, total);

    tracing::info!(
        source = source.id(),
        dois = dois.len(),
        batches = total,
        workers,
        "Fetching works"
    );

    let mut outcomes: Vec<BatchOutcome> = stream::iter(batches(dois, batch_size).enumerate())
        .map(|(index, batch)| async move {
            let result = source.works_by_dois(batch).await;
            BatchOutcome {
                index,
                dois: batch.to_vec(),
                result,
            }
        })
        .buffer_unordered(workers)
        .inspect(|outcome| {
            match &outcome.result {
                Ok(works) => tracing::debug!(
                    batch = outcome.index,
                    requested = outcome.dois.len(),
                    returned = works.len(),
                    "Batch complete"
                ),
                Err(e) => tracing::warn!(
                    batch = outcome.index,
                    size = outcome.dois.len(),
                    error = %e,
                    "Batch failed, its DOIs will have no metadata"
                ),
            }
            on_batch_done(outcome);
        })
        .collect()
        .await;

    outcomes.sort_by_key(|o| o.index);
    outcomes
}
