//! CLI binary for thesis-check.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ValidatorConfig`, uploads one file and prints the report views.

use anyhow::{Context, Result};
use clap::builder::TypedValueParser;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thesis_check::report::table::render_rows;
use thesis_check::{
    AcceptPolicy, ChartView, EndpointMap, ProgressCallback, TableView, ThesisCheckError,
    UploadProgressCallback, ValidationResult, Validator, ValidatorConfig,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Percentage bar for the upload.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Uploading");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl UploadProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, _generation: u64, file_name: &str, total_bytes: u64) {
        self.bar.set_message(format!(
            "{file_name} {}",
            dim(&format!("({:.1} KiB)", total_bytes as f64 / 1024.0))
        ));
    }

    fn on_progress(&self, _generation: u64, percent: u8) {
        self.bar.set_position(u64::from(percent));
        if percent == 100 {
            self.bar.set_prefix("Validating");
        }
    }

    fn on_upload_complete(&self, _generation: u64, error_count: usize) {
        self.bar.finish_and_clear();
        if error_count == 0 {
            eprintln!("{} no formatting errors found", green("✔"));
        } else {
            eprintln!(
                "{} {} formatting error(s) found",
                cyan("◆"),
                bold(&error_count.to_string())
            );
        }
    }

    fn on_upload_failed(&self, _generation: u64, _error: &str) {
        self.bar.abandon_with_message(red("failed"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Validate a Word template (routed to the Word backend)
  thesis-check thesis.docx

  # Validate a LaTeX source against a custom backend
  thesis-check --latex-endpoint http://validator:5000/api/validate/latex main.tex

  # One endpoint for both kinds
  thesis-check --endpoint http://localhost:8080/api/validate thesis.docx

  # Show every row, skip the chart, write the PDF elsewhere
  thesis-check --all --no-chart --report out/report.pdf thesis.docx

  # Machine-readable result, no PDF
  thesis-check --json --no-pdf thesis.docx > result.json

ENVIRONMENT VARIABLES:
  Every flag can also be set as THESIS_CHECK_<FLAG>, e.g.
  THESIS_CHECK_WORD_ENDPOINT, THESIS_CHECK_FONT, THESIS_CHECK_PAGE_SIZE.
  RUST_LOG overrides the log filter.

PDF FONT:
  The report is written in Cyrillic, so the embedded font must cover it.
  Without --font, DejaVu Sans, Liberation Sans, Noto Sans or Arial are
  looked up in the usual system locations.
"#;

/// Check a thesis template against the formatting validation service.
#[derive(Parser, Debug)]
#[command(
    name = "thesis-check",
    version,
    about = "Upload a thesis template (.docx or .tex) for formatting validation and show the report",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Word document (.docx) or LaTeX source (.tex) to validate.
    file: PathBuf,

    /// Send every upload to this URL, whatever its kind.
    #[arg(long, env = "THESIS_CHECK_ENDPOINT", conflicts_with_all = ["word_endpoint", "latex_endpoint"])]
    endpoint: Option<String>,

    /// Validation URL for Word documents.
    #[arg(long, env = "THESIS_CHECK_WORD_ENDPOINT", default_value = thesis_check::config::DEFAULT_WORD_ENDPOINT)]
    word_endpoint: String,

    /// Validation URL for LaTeX sources.
    #[arg(long, env = "THESIS_CHECK_LATEX_ENDPOINT", default_value = thesis_check::config::DEFAULT_LATEX_ENDPOINT)]
    latex_endpoint: String,

    /// Which document kinds to accept.
    #[arg(long, env = "THESIS_CHECK_ACCEPT", value_enum, default_value = "both")]
    accept: AcceptArg,

    /// Upload limit in bytes; files of this size or larger are refused.
    #[arg(long, env = "THESIS_CHECK_MAX_SIZE", default_value_t = thesis_check::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_size: u64,

    /// Upload timeout in seconds.
    #[arg(long, env = "THESIS_CHECK_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Table rows per page: 5, 10, 20 or 50.
    #[arg(long, env = "THESIS_CHECK_PAGE_SIZE", default_value_t = 5,
          value_parser = clap::builder::PossibleValuesParser::new(["5", "10", "20", "50"])
              .map(|s| s.parse::<usize>().unwrap_or(5)))]
    page_size: usize,

    /// Table page to show (1-based; past the end shows the last page).
    #[arg(long, env = "THESIS_CHECK_PAGE", default_value_t = 1)]
    page: usize,

    /// Show every table page.
    #[arg(long, env = "THESIS_CHECK_ALL")]
    all: bool,

    /// Where to write the PDF report.
    #[arg(long, env = "THESIS_CHECK_REPORT", default_value = "validation_report.pdf")]
    report: PathBuf,

    /// TrueType font for the PDF report (must cover Cyrillic).
    #[arg(long, env = "THESIS_CHECK_FONT")]
    font: Option<PathBuf>,

    /// Title line of the PDF report.
    #[arg(long, env = "THESIS_CHECK_TITLE")]
    title: Option<String>,

    /// Do not write the PDF report.
    #[arg(long, env = "THESIS_CHECK_NO_PDF")]
    no_pdf: bool,

    /// Do not print the error chart.
    #[arg(long, env = "THESIS_CHECK_NO_CHART")]
    no_chart: bool,

    /// Print the normalised result as JSON instead of the table and chart.
    #[arg(long, env = "THESIS_CHECK_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "THESIS_CHECK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "THESIS_CHECK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "THESIS_CHECK_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum AcceptArg {
    Word,
    Latex,
    Both,
}

impl From<AcceptArg> for AcceptPolicy {
    fn from(v: AcceptArg) -> Self {
        match v {
            AcceptArg::Word => AcceptPolicy::WordOnly,
            AcceptArg::Latex => AcceptPolicy::LatexOnly,
            AcceptArg::Both => AcceptPolicy::Both,
        }
    }
}

/// Width of the terminal chart in cells.
const CHART_WIDTH: usize = 40;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would interleave with the bar; keep them quiet
    // while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn UploadProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let mut validator = Validator::new(config).context("Failed to set up the HTTP client")?;

    // ── Intake ───────────────────────────────────────────────────────────
    match validator.select(&cli.file).await {
        Ok(kind) => {
            if !cli.quiet && !cli.json {
                eprintln!(
                    "{} {} {}",
                    cyan("◆"),
                    bold(&cli.file.display().to_string()),
                    dim(&format!("({kind})"))
                );
            }
        }
        Err(ThesisCheckError::IntakeRejected(rejection)) => {
            eprintln!("{} {}", red("✘"), rejection);
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to read the selected file"),
    }

    // ── Upload ───────────────────────────────────────────────────────────
    let result = validator
        .upload()
        .await
        .context("Validation failed")?
        .clone();

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
        println!("{json}");
    } else {
        print_views(&cli, &validator, &result);
    }

    // ── PDF export ───────────────────────────────────────────────────────
    // Runs last so a font problem never hides the table and chart.
    if !cli.no_pdf {
        let summary = validator
            .export_pdf_to_file()
            .await
            .context("PDF export failed")?;
        if !cli.quiet {
            eprintln!(
                "{} {} {}",
                green("✔"),
                bold(&cli.report.display().to_string()),
                dim(&format!("({} rows, {} page(s))", summary.rows, summary.pages))
            );
        }
    }

    Ok(())
}

fn print_views(cli: &Cli, validator: &Validator, result: &ValidationResult) {
    let colour = io::stdout().is_terminal();
    let report = &validator.config().report;

    if result.is_empty() {
        println!("{}", green("No formatting errors."));
        return;
    }

    let table = TableView::new(result, report.page_size, report.context_display_width);
    if cli.all {
        println!("{}", render_rows(&table.all_rows(), colour));
    } else {
        let page = table.page(cli.page);
        println!(
            "{}",
            bold(&format!(
                "Errors {}-{} of {} (page {}/{})",
                page.rows.first().map(|r| r.index).unwrap_or(0),
                page.rows.last().map(|r| r.index).unwrap_or(0),
                page.total_rows,
                page.number,
                page.total_pages
            ))
        );
        println!("{}", render_rows(&page.rows, colour));
    }

    if !cli.no_chart {
        let chart = ChartView::from_result(result);
        println!("{}", bold("Errors by type"));
        println!("{}", chart.render(CHART_WIDTH));
    }

    if !cli.quiet {
        let mut line = format!("{} error(s)", result.summary.total_errors);
        if let Some(paragraphs) = result.summary.total_paragraphs {
            line.push_str(&format!(" in {paragraphs} paragraphs"));
        }
        println!("{}", dim(&line));
    }
}

/// Map CLI args to `ValidatorConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ValidatorConfig> {
    let endpoints = match &cli.endpoint {
        Some(url) => EndpointMap::single(url.clone()),
        None => EndpointMap::routed(cli.word_endpoint.clone(), cli.latex_endpoint.clone()),
    };

    let mut builder = ValidatorConfig::builder()
        .endpoints(endpoints)
        .accept(cli.accept.into())
        .max_upload_bytes(cli.max_size)
        .upload_timeout_secs(cli.timeout)
        .page_size(cli.page_size)
        .report_filename(cli.report.clone());

    if let Some(ref font) = cli.font {
        builder = builder.report_font(font.clone());
    }
    if let Some(ref title) = cli.title {
        builder = builder.report_title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
