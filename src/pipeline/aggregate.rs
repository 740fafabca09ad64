//! Fan-in: flattening works, joining them onto submitted DOIs and exploding
//! authorships.

use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::models::{fields, AffiliationRow, AuthorRow, FlatRecord, InstitutionValue, MergedRow};
use crate::utils::{flatten, strip_doi_prefix};

/// Join key for a DOI. DOIs are case-insensitive.
fn join_key(doi: &str) -> String {
    strip_doi_prefix(doi.trim()).to_lowercase()
}

/// Left-join upstream works onto the submitted DOIs.
///
/// Every entry of `dois` yields exactly one row, in order. A work is keyed by
/// its own `doi` field with the resolver prefix stripped; works without a
/// DOI are ignored and, when several works share a DOI, the first wins.
pub fn merge<'a, I>(dois: &[String], works: I, max_depth: usize) -> Vec<MergedRow>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut by_doi: HashMap<String, FlatRecord> = HashMap::new();
    let mut duplicates = 0usize;

    for work in works {
        let Some(doi) = work.get(fields::DOI).and_then(Value::as_str) else {
            continue;
        };
        let key = join_key(doi);
        if by_doi.contains_key(&key) {
            duplicates += 1;
            continue;
        }
        by_doi.insert(key, flatten(work, max_depth));
    }

    if duplicates > 0 {
        tracing::debug!(duplicates, "Ignored duplicate upstream records");
    }

    dois.iter()
        .map(|doi| match by_doi.get(&join_key(doi)) {
            Some(record) => MergedRow::matched(doi.clone(), record.clone()),
            None => MergedRow::unmatched(doi.clone()),
        })
        .collect()
}

/// One row per authorship entry of each matched row
pub fn explode_authorships(rows: &[MergedRow]) -> Vec<AuthorRow> {
    rows.iter()
        .filter_map(|row| row.work.as_ref().map(|work| (row, work)))
        .flat_map(|(row, work)| {
            work.get_array(fields::AUTHORSHIPS)
                .iter()
                .map(move |authorship| author_row(&row.doi, authorship))
        })
        .collect()
}

fn author_row(doi: &str, authorship: &Value) -> AuthorRow {
    let institutions = authorship
        .get("institutions")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .map(|inst| InstitutionValue {
                    display_name: inst.get("display_name").and_then(Value::as_str).map(str::to_string),
                    country_code: inst.get("country_code").and_then(Value::as_str).map(str::to_string),
                    institution_type: inst.get("type").and_then(Value::as_str).map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    AuthorRow {
        doi: doi.to_string(),
        display_name: text_at(authorship, &["author", "display_name"]),
        orcid: text_at(authorship, &["author", "orcid"]),
        author_position: text_at(authorship, &["author_position"]),
        is_corresponding: lookup(authorship, &["is_corresponding"]).and_then(Value::as_bool),
        raw_author_name: text_at(authorship, &["raw_author_name"]),
        institutions,
    }
}

fn text_at(value: &Value, path: &[&str]) -> Option<String> {
    lookup(value, path).and_then(Value::as_str).map(str::to_string)
}

fn lookup<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .filter(|v| !v.is_null())
}

/// One row per author-institution pair.
///
/// An author without institutions still yields one row, with the
/// institution fields empty.
pub fn explode_institutions(authors: &[AuthorRow]) -> Vec<AffiliationRow> {
    let mut rows = Vec::new();
    for author in authors {
        if author.institutions.is_empty() {
            rows.push(AffiliationRow {
                doi: author.doi.clone(),
                author: author.display_name.clone(),
                institution: None,
                country_code: None,
                institution_type: None,
            });
            continue;
        }
        for inst in &author.institutions {
            rows.push(AffiliationRow {
                doi: author.doi.clone(),
                author: author.display_name.clone(),
                institution: inst.display_name.clone(),
                country_code: inst.country_code.clone(),
                institution_type: inst.institution_type.clone(),
            });
        }
    }
    rows
}

/// Distinct authors across all works, first-seen order
pub fn author_table(authors: &[AuthorRow]) -> Vec<AuthorRow> {
    let mut seen = HashSet::new();
    authors
        .iter()
        .filter(|a| {
            seen.insert((
                a.display_name.clone(),
                a.orcid.clone(),
                a.author_position.clone(),
                a.is_corresponding,
                a.raw_author_name.clone(),
            ))
        })
        .cloned()
        .collect()
}

/// Distinct (author, institution, country, type) rows, first-seen order.
///
/// The same author at the same institution on several works counts once.
pub fn affiliation_table(affiliations: &[AffiliationRow]) -> Vec<AffiliationRow> {
    let mut seen = HashSet::new();
    affiliations
        .iter()
        .filter(|a| {
            seen.insert((
                a.author.clone(),
                a.institution.clone(),
                a.country_code.clone(),
                a.institution_type.clone(),
            ))
        })
        .cloned()
        .collect()
}
