//! CLI status output and progress indicators.
//!
//! Everything here writes to stderr so stdout stays clean for tables and
//! JSON.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Warning,
    Info,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
    }
}

/// Check if stderr is a terminal.
pub fn stderr_is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    if !stderr_is_terminal() {
        eprintln!("{} {}", icon, msg);
        return;
    }
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
    }
}

/// Section header printed above each table.
pub fn section_header(title: &str, styled: bool) -> String {
    let line = format!("━━━ {} ━━━", title);
    if styled {
        line.bold().cyan().to_string()
    } else {
        line
    }
}

/// Progress bar over upstream batches.
///
/// Hidden when stderr is not a terminal or output is quiet.
pub struct BatchProgress {
    pb: indicatif::ProgressBar,
}

impl BatchProgress {
    /// Create a bar for `batches` requests
    pub fn new(batches: usize, quiet: bool) -> Self {
        let pb = if quiet || !stderr_is_terminal() {
            indicatif::ProgressBar::hidden()
        } else {
            indicatif::ProgressBar::new(batches as u64)
        };

        if let Ok(style) = indicatif::ProgressStyle::with_template(
            "{spinner:.cyan} Searching DOIs in OpenAlex {bar:30.cyan/blue} {pos}/{len} batches {msg}",
        ) {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ").progress_chars("█▓░"));
        }
        Self { pb }
    }

    /// Record one finished batch
    pub fn batch_done(&self, failed: bool) {
        if failed {
            self.pb.set_message("(some batches failed)");
        }
        self.pb.inc(1);
    }

    /// Remove the bar
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_icon() {
        assert_eq!(status_icon(Status::Success), "✓");
        assert_eq!(status_icon(Status::Warning), "⚠");
        assert_eq!(status_icon(Status::Info), "ℹ");
    }

    #[test]
    fn test_section_header_plain() {
        assert_eq!(section_header("Journals", false), "━━━ Journals ━━━");
    }

    #[test]
    fn test_hidden_progress_counts() {
        let progress = BatchProgress::new(3, true);
        progress.batch_done(false);
        progress.batch_done(true);
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
