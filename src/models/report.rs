//! Per-run results: merged rows, batch accounting and summary tables.

use serde::{Deserialize, Serialize};

use super::work::MergedRow;

/// A batch that contributed no results because its request failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Zero-based batch index
    pub index: usize,

    /// Number of DOIs in the batch
    pub size: usize,

    /// Human-readable reason
    pub reason: String,
}

/// Whether any submitted DOI matched an upstream record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// At least one DOI matched; carries the match count
    Found(usize),
    /// No DOI matched
    NoResults,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// One row per unique submitted DOI, in submission order
    pub rows: Vec<MergedRow>,

    /// Number of batches sent upstream
    pub total_batches: usize,

    /// Batches whose request failed
    pub failed_batches: Vec<BatchFailure>,
}

impl RunReport {
    /// Number of rows with a matching work
    pub fn matched(&self) -> usize {
        self.rows.iter().filter(|r| r.is_matched()).count()
    }

    /// Submitted DOIs with no matching work
    pub fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter(|r| !r.is_matched())
            .map(|r| r.doi.as_str())
    }

    pub fn outcome(&self) -> RunOutcome {
        match self.matched() {
            0 => RunOutcome::NoResults,
            n => RunOutcome::Found(n),
        }
    }

    /// True if some batches failed but the run still produced rows
    pub fn is_partial(&self) -> bool {
        !self.failed_batches.is_empty()
    }
}

/// One (label, count) pair; `label` is `None` for the missing-value bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: Option<String>,
    pub count: usize,
}

/// A frequency table over one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Section title, e.g. "Journals"
    pub title: String,
    pub label_header: String,
    pub count_header: String,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Sum of all counts, including the missing-value bucket
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Count for a given label (`None` for the missing bucket)
    pub fn count_of(&self, label: Option<&str>) -> usize {
        self.rows
            .iter()
            .find(|r| r.label.as_deref() == label)
            .map(|r| r.count)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlatRecord;

    #[test]
    fn test_outcome() {
        let mut report = RunReport {
            rows: vec![MergedRow::unmatched("10.1/a"), MergedRow::unmatched("10.1/b")],
            total_batches: 1,
            failed_batches: Vec::new(),
        };
        assert_eq!(report.outcome(), RunOutcome::NoResults);
        assert_eq!(report.unmatched().count(), 2);

        report.rows[1] = MergedRow::matched("10.1/b", FlatRecord::new());
        assert_eq!(report.outcome(), RunOutcome::Found(1));
        assert_eq!(report.unmatched().collect::<Vec<_>>(), vec!["10.1/a"]);
    }

    #[test]
    fn test_summary_table_total() {
        let table = SummaryTable {
            title: "OA".to_string(),
            label_header: "OA status".to_string(),
            count_header: "# Outputs".to_string(),
            rows: vec![
                SummaryRow {
                    label: Some("gold".to_string()),
                    count: 3,
                },
                SummaryRow {
                    label: None,
                    count: 2,
                },
            ],
        };
        assert_eq!(table.total(), 5);
        assert_eq!(table.count_of(Some("gold")), 3);
        assert_eq!(table.count_of(None), 2);
        assert_eq!(table.count_of(Some("green")), 0);
    }
}
