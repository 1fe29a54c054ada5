//! CLI binary for filmaffinity-export.
//!
//! A thin shim over the library crate: asks for the user ID when none is
//! given, maps flags to `ExportConfig`, and prints status lines.

use anyhow::{Context, Result};
use clap::Parser;
use filmaffinity_export::config::{
    DEFAULT_FONT_DIR, DEFAULT_FONT_FAMILY, DEFAULT_LISTING_URL, DEFAULT_SITE_ROOT,
};
use filmaffinity_export::pipeline::document::{find_system_font_family, has_font_family};
use filmaffinity_export::{
    default_output_path, fetch_ratings, render_records, AssetKind, ExportConfig,
    ExportProgressCallback, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while listing pages are fetched, then a bar
/// over the records while the PDF is laid out.
struct CliProgressCallback {
    bar: ProgressBar,
    asset_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Fetching");
        bar.set_message("listing page 1…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            asset_errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} movies  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Exporting");
        self.bar.reset_eta();
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_listing_page(&self, page: u32, records_on_page: usize) {
        self.bar.println(format!(
            "  {} Listing page {:>3}  {}",
            green("✓"),
            page,
            dim(&format!("{records_on_page:>3} movies")),
        ));
        self.bar.set_message(format!("listing page {}…", page + 1));
    }

    fn on_fetch_complete(&self, total_records: usize) {
        self.bar.set_message(format!("{total_records} movies found"));
    }

    fn on_export_start(&self, total_records: usize, _output_path: &Path) {
        self.activate_bar(total_records);
    }

    fn on_record_composed(&self, _index: usize, _total_records: usize, title: &str) {
        // Truncate very long titles to keep the bar on one line.
        let msg: String = if title.chars().count() > 40 {
            format!("{}\u{2026}", title.chars().take(39).collect::<String>())
        } else {
            title.to_string()
        };
        self.bar.set_message(msg);
        self.bar.inc(1);
    }

    fn on_asset_error(&self, title: &str, kind: AssetKind, error: &str) {
        self.asset_errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Error loading {} for {}: {}",
            red("✗"),
            kind.as_str(),
            bold(title),
            dim(error),
        ));
    }

    fn on_export_complete(&self, total_records: usize, _output_path: &Path) {
        self.bar.finish_and_clear();
        let failed = self.asset_errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} movies laid out", green("✔"), bold(&total_records.to_string()));
        } else {
            eprintln!(
                "{} {} movies laid out  ({} images missing)",
                cyan("⚠"),
                bold(&total_records.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask for the user ID interactively
  fa-export

  # Export a profile to ./fa_ratings_123456.pdf
  fa-export 123456

  # Choose the output file
  fa-export 123456 -o ~/Documents/ratings.pdf

  # Dump the extracted records as JSON instead of writing a PDF
  fa-export 123456 --json > ratings.json

FONTS:
  Text is measured with TrueType fonts loaded from --font-dir:
    <font-dir>/<family>-Regular.ttf, -Bold.ttf, -Italic.ttf, -BoldItalic.ttf
  The default is the Liberation Sans family (fonts-liberation on Debian/Ubuntu).
  <family>.ttf is accepted for the regular face, -Oblique for italics, and
  missing bold/italic faces fall back to the regular one. If the family is
  not found, common system families (Liberation, DejaVu) are tried.
  The fonts are embedded, so any character they cover is printed.

ENVIRONMENT VARIABLES:
  FA_EXPORT_OUTPUT        Output PDF path
  FA_EXPORT_FONT_DIR      Font directory
  FA_EXPORT_FONT_FAMILY   Font family file prefix
  FA_EXPORT_LISTING_URL   Ratings listing endpoint
  FA_EXPORT_SITE_ROOT     Prefix for flag image sources
  RUST_LOG                tracing filter, overrides -v/-q
"#;

/// Export a FilmAffinity rating history to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "fa-export",
    version,
    about = "Export a FilmAffinity rating history to a paginated PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// FilmAffinity user ID. Prompted for when omitted.
    user_id: Option<String>,

    /// Write the PDF here instead of ./fa_ratings_<id>.pdf.
    #[arg(short, long, env = "FA_EXPORT_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory containing the TrueType font family.
    #[arg(long, env = "FA_EXPORT_FONT_DIR", default_value = DEFAULT_FONT_DIR)]
    font_dir: PathBuf,

    /// Font family file prefix (e.g. LiberationSans, DejaVuSans).
    #[arg(long, env = "FA_EXPORT_FONT_FAMILY", default_value = DEFAULT_FONT_FAMILY)]
    font_family: String,

    /// Ratings listing endpoint.
    #[arg(long, env = "FA_EXPORT_LISTING_URL", default_value = DEFAULT_LISTING_URL)]
    listing_url: String,

    /// Prefix for flag image sources.
    #[arg(long, env = "FA_EXPORT_SITE_ROOT", default_value = DEFAULT_SITE_ROOT)]
    site_root: String,

    /// Leave out the heading above the first movie.
    #[arg(long)]
    no_heading: bool,

    /// Print the extracted records as JSON instead of writing a PDF.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FA_EXPORT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep library logs to errors while the progress bar is drawn; the bar
    // and the asset-error lines carry the useful feedback.
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

    // ── User ID ──────────────────────────────────────────────────────────
    let user_id = match cli.user_id.clone() {
        Some(id) => id,
        None => prompt_user_id().context("Failed to read user ID")?,
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExportProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Fetch ────────────────────────────────────────────────────────────
    if !cli.quiet && !cli.json {
        println!("Getting rated movies...");
    }
    let records = fetch_ratings(&user_id, &config)
        .await
        .context("Fetching ratings failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&records).context("Failed to serialise records")?;
        println!("{json}");
        return Ok(());
    }

    // ── Export ───────────────────────────────────────────────────────────
    let output_path = match cli.output.clone() {
        Some(p) => p,
        None => default_output_path(&user_id, &config)?,
    };

    if !cli.quiet {
        println!("Exporting to PDF: {}", output_path.display());
    }
    let summary = render_records(&records, &user_id, &output_path, &config)
        .await
        .context("Export failed")?;

    if !cli.quiet {
        println!(
            "Export completed! {} movies have been exported.",
            summary.records
        );
    }

    Ok(())
}

/// Ask for the user ID on stdin.
fn prompt_user_id() -> Result<String> {
    print!("Please enter your FilmAffinity user ID: ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// The requested font family, or an installed system family when the
/// requested one is absent.
fn resolve_fonts(dir: &Path, family: &str) -> (PathBuf, String) {
    if has_font_family(dir, family) {
        return (dir.to_path_buf(), family.to_string());
    }
    match find_system_font_family() {
        Some((found_dir, found_family)) => {
            tracing::warn!(
                "Font family {} not found in {}; using {} from {}",
                family,
                dir.display(),
                found_family,
                found_dir.display()
            );
            (found_dir, found_family.to_string())
        }
        None => (dir.to_path_buf(), family.to_string()),
    }
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let (font_dir, font_family) = resolve_fonts(&cli.font_dir, &cli.font_family);
    let mut builder = ExportConfig::builder()
        .listing_url(&cli.listing_url)
        .site_root(&cli.site_root)
        .font_dir(font_dir)
        .font_family(font_family)
        .include_heading(!cli.no_heading);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
