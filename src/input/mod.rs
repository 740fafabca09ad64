//! Reading submitted DOIs from text and CSV files.

use std::io::Read;
use std::path::Path;

use crate::utils::{split_lines, InputError};

/// Accepted names for the DOI column of a CSV file, in priority order
pub const DOI_COLUMNS: &[&str] = &["doi", "DOI", "dois", "DOIs", "Hyperlinked DOI"];

/// Find the DOI column among `headers`, honouring [`DOI_COLUMNS`] order
pub fn find_doi_column<'a, I>(headers: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    DOI_COLUMNS.iter().find_map(|wanted| {
        headers
            .clone()
            .into_iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == *wanted)
    })
}

/// Read the DOI column of a CSV document.
///
/// Rows may be ragged; a row too short to reach the DOI column, or with an
/// empty cell there, is skipped.
pub fn read_csv_dois<R: Read>(reader: R) -> Result<Vec<String>, InputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let names: Vec<&str> = headers.iter().collect();
    let column = find_doi_column(names.iter().copied()).ok_or_else(|| InputError::NoDoiColumn {
        expected: DOI_COLUMNS.iter().map(|c| c.to_string()).collect(),
    })?;

    let mut dois = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(value) = record.get(column).filter(|v| !v.is_empty()) {
            dois.push(value.to_string());
        }
    }

    tracing::debug!(column = &headers[column], rows = dois.len(), "Read DOI column from CSV");
    Ok(dois)
}

/// Read the DOI column of a CSV file on disk
pub fn read_csv_file(path: &Path) -> Result<Vec<String>, InputError> {
    let file = std::fs::File::open(path)?;
    read_csv_dois(file)
}

/// Read one DOI per line from a text file on disk
pub fn read_text_file(path: &Path) -> Result<Vec<String>, InputError> {
    let text = std::fs::read_to_string(path)?;
    Ok(lines(&text))
}

/// Read one DOI per line from any reader (stdin)
pub fn read_text<R: Read>(mut reader: R) -> Result<Vec<String>, InputError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(lines(&text))
}

fn lines(text: &str) -> Vec<String> {
    split_lines(text).into_iter().map(str::to_string).collect()
}
