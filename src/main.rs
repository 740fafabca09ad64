use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use doi_search::config::{default_config_path, find_config_file, load_config, Config};
use doi_search::input::{read_csv_file, read_text, read_text_file};
use doi_search::models::{fields, MergedRow, RunOutcome, RunReport};
use doi_search::pipeline::{oa_sentence, Pipeline, RunRequest, RunSummary, SummaryField};
use doi_search::sources::OpenAlexSource;
use doi_search::ui::{print_status, section_header, BatchProgress, Status};
use doi_search::utils::{
    is_terminal, label_width, render_affiliations, render_authors, render_rows, render_summary,
    terminal_width, MISSING_LABEL,
};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DOI Search - Look up DOIs in OpenAlex and summarize open access, journals and affiliations
#[derive(Parser, Debug)]
#[command(name = "doi-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up DOIs in OpenAlex and summarize the results", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up DOIs in OpenAlex
    #[command(alias = "s")]
    Search {
        /// DOIs to look up (read from stdin when none are given)
        dois: Vec<String>,

        /// Text file with one DOI per line
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// CSV file with a DOI column
        #[arg(long)]
        csv: Option<PathBuf>,

        /// DOIs per request (1-100)
        #[arg(long, short)]
        batch_size: Option<usize>,

        /// Maximum concurrent requests
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Contact email for the OpenAlex polite pool
        #[arg(long)]
        mailto: Option<String>,

        /// OpenAlex API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Write merged rows to a CSV file
        #[arg(long, short)]
        export: Option<PathBuf>,

        /// Also show per-DOI rows, authors and affiliations
        #[arg(long, short)]
        details: bool,
    },

    /// Show or create the configuration file
    Config {
        /// Write a default configuration file (to PATH or the user config dir)
        #[arg(long, num_args = 0..=1, value_name = "PATH")]
        init: Option<Option<PathBuf>>,

        /// Overwrite an existing file
        #[arg(long, requires = "init")]
        force: bool,
    },
}

fn print_env_vars() {
    println!("DOI Search - Environment Variables");
    println!();
    println!("OpenAlex:");
    println!("  OPENALEX_EMAIL                        Email for OpenAlex 'polite pool' access");
    println!("  DOI_SEARCH_OPENALEX__BASE_URL         API base URL (default: https://api.openalex.org)");
    println!("  DOI_SEARCH_OPENALEX__MAILTO           Email, takes precedence over OPENALEX_EMAIL");
    println!();
    println!("Fetching:");
    println!("  DOI_SEARCH_FETCH__BATCH_SIZE          DOIs per request (default: 20, max: 100)");
    println!("  DOI_SEARCH_FETCH__MAX_CONCURRENT      Concurrent requests (default: 8)");
    println!("  DOI_SEARCH_FETCH__TIMEOUT_SECS        Request timeout in seconds (default: 30)");
    println!("  DOI_SEARCH_FETCH__MAX_DOIS            Maximum unique DOIs per run (default: 500)");
    println!("  DOI_SEARCH_FETCH__LARGE_REQUEST_WARNING  Warn above this many DOIs (default: 100)");
    println!();
    println!("Flattening:");
    println!("  DOI_SEARCH_FLATTEN__MAX_DEPTH         Nesting depth of flattened fields (default: 6)");
    println!();
    println!("Logging:");
    println!("  RUST_LOG                              Log filter (default: doi_search=info)");
    println!();
    println!("Global Proxy Settings:");
    println!("  HTTP_PROXY                            HTTP proxy URL (e.g., http://proxy:8080)");
    println!("  HTTPS_PROXY                           HTTPS proxy URL (e.g., https://proxy:8080)");
    println!("  NO_PROXY                              Comma-separated list of hosts to bypass proxy");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
        return Ok(());
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("doi_search={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from file if specified or found in default locations
    let config_path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }
    let mut config = load_config(config_path.as_deref())?;
    if let Some(timeout) = cli.timeout {
        config.fetch.timeout_secs = timeout;
    }

    match cli.command {
        Some(Commands::Search {
            dois,
            file,
            csv,
            batch_size,
            max_concurrent,
            mailto,
            base_url,
            export,
            details,
        }) => {
            if let Some(n) = batch_size {
                config.fetch.batch_size = n;
            }
            if let Some(n) = max_concurrent {
                config.fetch.max_concurrent = n;
            }
            if mailto.is_some() {
                config.openalex.mailto = mailto;
            }
            if let Some(url) = base_url {
                config.openalex.base_url = url;
            }

            let request = collect_request(dois, file.as_deref(), csv.as_deref())?;
            run_search(
                &config,
                &request,
                cli.output,
                cli.quiet,
                export.as_deref(),
                details,
            )
            .await?;
        }

        Some(Commands::Config { init, force }) => match init {
            Some(path) => {
                let path = path
                    .or_else(default_config_path)
                    .context("Could not determine a config directory; pass a path to --init")?;
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                Config::default().save(&path)?;
                print_status(
                    Status::Success,
                    &format!("Wrote default configuration to {}", path.display()),
                );
            }
            None => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },

        None => {
            // No command specified, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

/// Gather submitted DOIs from arguments, files and stdin
fn collect_request(
    args: Vec<String>,
    file: Option<&Path>,
    csv: Option<&Path>,
) -> Result<RunRequest> {
    let mut submitted = args;

    if let Some(path) = file {
        submitted.extend(
            read_text_file(path).with_context(|| format!("Failed to read {}", path.display()))?,
        );
    }
    if let Some(path) = csv {
        submitted.extend(
            read_csv_file(path).with_context(|| format!("Failed to read {}", path.display()))?,
        );
    }

    if submitted.is_empty() && !std::io::stdin().is_terminal() {
        submitted = read_text(std::io::stdin().lock())?;
    }

    Ok(RunRequest::new(submitted))
}

async fn run_search(
    config: &Config,
    request: &RunRequest,
    format: OutputFormat,
    quiet: bool,
    export: Option<&Path>,
    details: bool,
) -> Result<()> {
    let source = OpenAlexSource::with_base_url(
        &config.openalex.base_url,
        config.mailto(),
        config.timeout(),
    )?;
    let pipeline = Pipeline::new(Arc::new(source), config.fetch_options());

    let dois = pipeline.prepare(request)?;
    if !quiet {
        print_status(
            Status::Info,
            &format!("Number of unique DOIs entered: {}", dois.len()),
        );
    }
    if dois.len() > config.fetch.large_request_warning {
        tracing::warn!(
            count = dois.len(),
            "Large number of DOIs submitted, retrieving data may take some time"
        );
    }

    let progress = BatchProgress::new(pipeline.batches_for(dois.len()), quiet);
    let report = pipeline
        .lookup(&dois, |batch| progress.batch_done(batch.result.is_err()))
        .await;
    progress.finish();

    if let Some(path) = export {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_rows_csv(&report.rows, file)?;
        if !quiet {
            print_status(
                Status::Success,
                &format!("Exported {} rows to {}", report.rows.len(), path.display()),
            );
        }
    }

    output_report(&report, format, details)
}

/// Columns written by `--export`
const EXPORT_COLUMNS: [(&str, &str); 7] = [
    ("doi", fields::DOI),
    ("id", fields::ID),
    ("title", fields::TITLE),
    ("publication_year", fields::PUBLICATION_YEAR),
    ("oa_status", fields::OA_STATUS),
    ("is_oa", fields::IS_OA),
    ("journal", fields::JOURNAL),
];

/// Write merged rows as CSV; the `doi` column is always the submitted DOI
fn write_rows_csv<W: Write>(rows: &[MergedRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS.iter().map(|(name, _)| *name))?;

    for row in rows {
        let mut record = vec![row.doi.clone()];
        record.extend(
            EXPORT_COLUMNS[1..]
                .iter()
                .map(|(_, path)| row.text(path).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn failed_batches_message(report: &RunReport) -> Option<String> {
    if report.is_partial() {
        Some(format!(
            "{} of {} batches failed; their DOIs are reported without metadata",
            report.failed_batches.len(),
            report.total_batches
        ))
    } else {
        None
    }
}

fn output_report(report: &RunReport, format: OutputFormat, details: bool) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    let summary = RunSummary::from_report(report);

    match actual_format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "outcome": report.outcome(),
                "total_batches": report.total_batches,
                "failed_batches": report.failed_batches,
                "rows": report.rows,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Plain => {
            if let Some(msg) = failed_batches_message(report) {
                println!("warning: {}", msg);
            }
            if report.outcome() == RunOutcome::NoResults {
                println!("No results found in OpenAlex");
                return Ok(());
            }
            if let Some(sentence) = oa_sentence(&summary.is_oa) {
                println!("{}", sentence);
            }
            for field in SummaryField::ALL {
                let table = summary.table(field);
                println!();
                println!("# {}", table.title);
                for row in &table.rows {
                    println!(
                        "{}\t{}",
                        row.label.as_deref().unwrap_or(MISSING_LABEL),
                        row.count
                    );
                }
            }
            if details {
                println!();
                println!("# Rows");
                for row in &report.rows {
                    println!(
                        "{}\t{}\t{}",
                        row.doi,
                        row.text(fields::OA_STATUS).unwrap_or_default(),
                        row.text(fields::JOURNAL).unwrap_or_default()
                    );
                }
            }
        }
        OutputFormat::Table => {
            if let Some(msg) = failed_batches_message(report) {
                print_status(Status::Warning, &msg);
            }
            if report.outcome() == RunOutcome::NoResults {
                print_status(Status::Warning, "No results found in OpenAlex");
                return Ok(());
            }
            if let Some(sentence) = oa_sentence(&summary.is_oa) {
                print_status(Status::Success, &sentence);
            }

            let styled = is_terminal();
            let max_label = label_width(terminal_width());
            for field in SummaryField::ALL {
                let table = summary.table(field);
                println!();
                println!("{}", section_header(&table.title, styled));
                println!("{}", render_summary(table, max_label));
            }

            if details {
                println!();
                println!("{}", section_header("DOIs", styled));
                println!("{}", render_rows(&report.rows, max_label));
                println!();
                println!("{}", section_header("Authors", styled));
                println!("{}", render_authors(&summary.authors, max_label));
                println!();
                println!("{}", section_header("Affiliations", styled));
                println!("{}", render_affiliations(&summary.affiliations, max_label));
            }
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}
