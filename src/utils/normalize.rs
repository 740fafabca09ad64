//! DOI input normalization.
//!
//! Submitted identifiers are trimmed, stripped of any resolver prefix and
//! deduplicated in first-seen order. No syntax validation happens here:
//! a malformed identifier passes through and simply fails to match upstream.

use std::collections::HashSet;
use thiserror::Error;

/// Resolver prefixes removed from submitted DOIs and from upstream `doi` fields.
///
/// `https://doi.org/` is what OpenAlex itself returns.
pub const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Default cap on unique DOIs per run
pub const DEFAULT_MAX_DOIS: usize = 500;

/// Errors raised before any network call is made
#[derive(Error, Debug)]
pub enum InputError {
    #[error("No DOIs were submitted")]
    NoDois,

    #[error("Too many DOIs: {count} unique DOIs submitted, the limit is {max}")]
    TooManyDois { count: usize, max: usize },

    #[error(
        "No DOI column in the file. The column listing DOIs must be named one of: {}",
        .expected.join(", ")
    )]
    NoDoiColumn { expected: Vec<String> },

    #[error("Problem parsing the CSV file (check for stray commas or improperly quoted values): {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Strip every leading resolver prefix from a DOI.
///
/// Prefixes are removed repeatedly, so the result never starts with one and
/// applying the function twice is the same as applying it once.
pub fn strip_doi_prefix(doi: &str) -> &str {
    let mut rest = doi;
    loop {
        let stripped = DOI_PREFIXES.iter().find_map(|prefix| {
            rest.get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &rest[prefix.len()..])
        });
        match stripped {
            Some(next) => rest = next.trim_start(),
            None => return rest,
        }
    }
}

/// Normalize a single submitted value; `None` if nothing is left.
pub fn normalize_doi(raw: &str) -> Option<String> {
    let doi = strip_doi_prefix(raw.trim()).trim();
    if doi.is_empty() {
        None
    } else {
        Some(doi.to_string())
    }
}

/// Normalize a list of submitted values.
///
/// Returns the unique, trimmed, prefix-free identifiers in first-seen order.
/// Blank entries are dropped silently. More than `max` unique identifiers is
/// an error.
pub fn normalize_dois<I, S>(raw: I, max: usize) -> Result<Vec<String>, InputError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut dois = Vec::new();

    for value in raw {
        if let Some(doi) = normalize_doi(value.as_ref()) {
            if seen.insert(doi.clone()) {
                dois.push(doi);
            }
        }
    }

    if dois.len() > max {
        return Err(InputError::TooManyDois {
            count: dois.len(),
            max,
        });
    }

    Ok(dois)
}

/// Split free text into one candidate DOI per line
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}
