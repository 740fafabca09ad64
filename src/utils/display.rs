//! Terminal display utilities for summary and row tables.
//!
//! Handles terminal width detection and unicode-aware truncation so long
//! institution and journal names do not wrap tables on narrow terminals.

use comfy_table::{presets, Attribute, Cell, CellAlignment, ContentArrangement, Table};
use std::io::{self, IsTerminal};
use std::sync::OnceLock;
use terminal_size::terminal_size;
use unicode_width::UnicodeWidthChar;

use crate::models::{fields, AffiliationRow, AuthorRow, MergedRow, SummaryTable};

/// Default width when terminal size cannot be determined.
pub const DEFAULT_WIDTH: usize = 100;

/// Label used for the missing-value bucket of a summary table
pub const MISSING_LABEL: &str = "(none)";

/// Terminal information with cached size and capabilities.
#[derive(Debug, Clone)]
pub struct Terminal {
    width: usize,
    is_tty: bool,
}

static TERMINAL_INFO: OnceLock<Terminal> = OnceLock::new();

/// Get the global terminal information, initialized on first call.
pub fn terminal_info() -> &'static Terminal {
    TERMINAL_INFO.get_or_init(|| Terminal {
        width: terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(DEFAULT_WIDTH),
        is_tty: io::stdout().is_terminal(),
    })
}

/// Get the current terminal width in characters.
#[inline]
pub fn terminal_width() -> usize {
    terminal_info().width
}

/// Check if stdout is a terminal.
#[inline]
pub fn is_terminal() -> bool {
    terminal_info().is_tty
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
///
/// Returns a string that fits within `max_width` columns, appending an
/// ellipsis if truncation occurred.
///
/// # Examples
///
/// ```
/// use doi_search::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();
    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;
    for (i, (_, w)) in char_widths.iter().enumerate() {
        // 3 columns are reserved for the ellipsis
        if current_width + w > max_width.saturating_sub(3) {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Width available for the label column of a two-column table
pub fn label_width(terminal_width: usize) -> usize {
    // borders, padding and a count column of ~12
    terminal_width.saturating_sub(20).clamp(20, 80)
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render a summary table as a two-column terminal table
pub fn render_summary(summary: &SummaryTable, max_label: usize) -> Table {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new(&summary.label_header).add_attribute(Attribute::Bold),
        Cell::new(&summary.count_header).add_attribute(Attribute::Bold),
    ]);

    for row in &summary.rows {
        let label = row.label.as_deref().unwrap_or(MISSING_LABEL);
        table.add_row(vec![
            Cell::new(truncate_with_ellipsis(label, max_label)),
            Cell::new(row.count).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// Render merged rows: DOI, whether found, OA status, journal
pub fn render_rows(rows: &[MergedRow], max_label: usize) -> Table {
    let mut table = base_table();
    table.set_header(vec!["DOI", "Found", "OA status", "Journal"]);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.doi),
            Cell::new(if row.is_matched() { "yes" } else { "no" }),
            Cell::new(row.text(fields::OA_STATUS).unwrap_or_default()),
            Cell::new(truncate_with_ellipsis(
                &row.text(fields::JOURNAL).unwrap_or_default(),
                max_label,
            )),
        ]);
    }
    table
}

/// Render the distinct author table
pub fn render_authors(authors: &[AuthorRow], max_label: usize) -> Table {
    let mut table = base_table();
    table.set_header(vec!["Author", "ORCID", "Position", "Corresponding", "Raw name"]);

    for a in authors {
        table.add_row(vec![
            Cell::new(truncate_with_ellipsis(a.display_name.as_deref().unwrap_or_default(), max_label)),
            Cell::new(a.orcid.as_deref().unwrap_or_default()),
            Cell::new(a.author_position.as_deref().unwrap_or_default()),
            Cell::new(a.is_corresponding.map(|c| c.to_string()).unwrap_or_default()),
            Cell::new(truncate_with_ellipsis(a.raw_author_name.as_deref().unwrap_or_default(), max_label)),
        ]);
    }
    table
}

/// Render the distinct author-institution table
pub fn render_affiliations(affiliations: &[AffiliationRow], max_label: usize) -> Table {
    let mut table = base_table();
    table.set_header(vec!["Author", "Institution", "Country", "Type"]);

    for a in affiliations {
        table.add_row(vec![
            Cell::new(truncate_with_ellipsis(a.author.as_deref().unwrap_or_default(), max_label)),
            Cell::new(truncate_with_ellipsis(a.institution.as_deref().unwrap_or_default(), max_label)),
            Cell::new(a.country_code.as_deref().unwrap_or_default()),
            Cell::new(a.institution_type.as_deref().unwrap_or_default()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryRow;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Hello", 10), "Hello");
        assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
        assert_eq!(truncate_with_ellipsis("Hello", 0), "");
        assert_eq!(truncate_with_ellipsis("Hello World", 3), "...");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK character is two columns wide
        assert_eq!(truncate_with_ellipsis("東京大学医学部", 9), "東京大...");
    }

    #[test]
    fn test_label_width_bounds() {
        assert_eq!(label_width(10), 20);
        assert_eq!(label_width(100), 80);
        assert_eq!(label_width(60), 40);
    }

    #[test]
    fn test_render_summary_uses_missing_label() {
        let summary = SummaryTable {
            title: "Journals".to_string(),
            label_header: "Journal name".to_string(),
            count_header: "# Outputs".to_string(),
            rows: vec![
                SummaryRow {
                    label: Some("BMJ Global Health".to_string()),
                    count: 2,
                },
                SummaryRow { label: None, count: 1 },
            ],
        };
        let rendered = render_summary(&summary, 40).to_string();
        assert!(rendered.contains("Journal name"));
        assert!(rendered.contains("BMJ Global Health"));
        assert!(rendered.contains(MISSING_LABEL));
    }

    #[test]
    fn test_render_rows() {
        let rows = vec![MergedRow::unmatched("10.1/missing")];
        let rendered = render_rows(&rows, 40).to_string();
        assert!(rendered.contains("10.1/missing"));
        assert!(rendered.contains("no"));
    }
}
