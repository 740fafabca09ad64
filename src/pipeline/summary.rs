//! Frequency tables over merged rows and affiliations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{fields, AffiliationRow, MergedRow, SummaryRow, SummaryTable};

/// Fields a summary table can be built over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryField {
    /// `open_access.oa_status` (gold, green, hybrid, bronze, closed, ...)
    OaStatus,
    /// `open_access.is_oa`, shown as Open Access / Closed Access
    IsOa,
    /// `primary_location.source.display_name`
    Journal,
    /// Institution display name, one per distinct author affiliation
    Institution,
    /// Institution country code, one per distinct author affiliation
    Country,
}

impl SummaryField {
    pub const ALL: [SummaryField; 5] = [
        SummaryField::OaStatus,
        SummaryField::IsOa,
        SummaryField::Journal,
        SummaryField::Institution,
        SummaryField::Country,
    ];

    /// Section title
    pub fn title(self) -> &'static str {
        match self {
            SummaryField::OaStatus => "Open Access Status Summary",
            SummaryField::IsOa => "Open Access",
            SummaryField::Journal => "Journals",
            SummaryField::Institution => "Institutional Affiliations",
            SummaryField::Country => "Country Affiliations",
        }
    }

    /// (label, count) column headers
    pub fn headers(self) -> (&'static str, &'static str) {
        match self {
            SummaryField::OaStatus => ("OA status", "# Outputs"),
            SummaryField::IsOa => ("Is OA?", "# Outputs"),
            SummaryField::Journal => ("Journal name", "# Outputs"),
            SummaryField::Institution => ("Institution", "# Count"),
            SummaryField::Country => ("Country Code", "# Count"),
        }
    }

    /// Whether the table counts affiliations rather than merged rows
    pub fn is_affiliation_field(self) -> bool {
        matches!(self, SummaryField::Institution | SummaryField::Country)
    }

    /// Value of this field on a merged row
    fn row_value(self, row: &MergedRow) -> Option<String> {
        match self {
            SummaryField::OaStatus => row.text(fields::OA_STATUS),
            SummaryField::IsOa => row
                .field(fields::IS_OA)
                .and_then(|v| v.as_bool())
                .map(|is_oa| oa_label(is_oa).to_string()),
            SummaryField::Journal => row.text(fields::JOURNAL),
            SummaryField::Institution | SummaryField::Country => None,
        }
    }

    /// Value of this field on an affiliation row
    fn affiliation_value(self, row: &AffiliationRow) -> Option<String> {
        match self {
            SummaryField::Institution => row.institution.clone(),
            SummaryField::Country => row.country_code.clone(),
            _ => None,
        }
    }
}

/// Label for the `is_oa` flag
pub fn oa_label(is_oa: bool) -> &'static str {
    if is_oa {
        "Open Access"
    } else {
        "Closed Access"
    }
}

/// Count values, including a bucket for missing ones.
///
/// Sorted by count descending, then label ascending, with the missing
/// bucket last among equal counts.
pub fn value_counts<I>(values: I) -> Vec<SummaryRow>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut counts: HashMap<Option<String>, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut rows: Vec<SummaryRow> = counts
        .into_iter()
        .map(|(label, count)| SummaryRow { label, count })
        .collect();

    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| match (&a.label, &b.label) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
    rows
}

/// Summarize a merged-row field (`OaStatus`, `IsOa`, `Journal`).
///
/// The counts always add up to `rows.len()`.
pub fn summarize_rows(rows: &[MergedRow], field: SummaryField) -> SummaryTable {
    table(field, value_counts(rows.iter().map(|r| field.row_value(r))))
}

/// Summarize an affiliation field (`Institution`, `Country`) over the
/// deduplicated affiliation table.
pub fn summarize_affiliations(affiliations: &[AffiliationRow], field: SummaryField) -> SummaryTable {
    table(
        field,
        value_counts(affiliations.iter().map(|a| field.affiliation_value(a))),
    )
}

fn table(field: SummaryField, rows: Vec<SummaryRow>) -> SummaryTable {
    let (label_header, count_header) = field.headers();
    SummaryTable {
        title: field.title().to_string(),
        label_header: label_header.to_string(),
        count_header: count_header.to_string(),
        rows,
    }
}

/// One-line summary of an `IsOa` table, e.g.
/// "3 Open Access and 2 Closed Access papers found"
///
/// Rows without a known status are appended after the sentence, e.g.
/// "..., 1 with unknown access status".
pub fn oa_sentence(table: &SummaryTable) -> Option<String> {
    let known: Vec<String> = table
        .rows
        .iter()
        .filter_map(|r| r.label.as_deref().map(|label| format!("{} {}", r.count, label)))
        .collect();
    let unknown = table.count_of(None);

    match (known.is_empty(), unknown) {
        (true, 0) => None,
        (true, n) => Some(format!("{} papers with unknown access status found", n)),
        (false, 0) => Some(format!("{} papers found", known.join(" and "))),
        (false, n) => Some(format!(
            "{} papers found, {} with unknown access status",
            known.join(" and "),
            n
        )),
    }
}
