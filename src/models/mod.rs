//! Core data models for DOI lookups and run reports.

mod report;
mod work;

pub use report::{BatchFailure, RunOutcome, RunReport, SummaryRow, SummaryTable};
pub use work::{fields, AffiliationRow, AuthorRow, FlatRecord, InstitutionValue, MergedRow};
