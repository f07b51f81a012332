//! CLI binary for depict-board.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `RenderOptions` / `DepictConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use depict_board::{
    depict, depict_checked, read_input, write_output, Abbreviation, Annotation, ArrowStyle,
    DativeMode, DepictConfig, DepictProgressCallback, HydrogenDisplay, ProgressCallback,
    RenderOptions, RenderOutput, Style, DEFAULT_ZOOM, MAX_RECORDS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::path::PathBuf;
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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback for `--check`: a progress bar plus one line per
/// failed depiction. Probes finish out of order, so lines carry the record
/// position.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} records  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Checking");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl DepictProgressCallback for CliProgressCallback {
    fn on_probe_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_record_loaded(&self, _position: usize, _total: usize, _bytes: usize) {
        self.bar.inc(1);
    }

    fn on_record_error(&self, position: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((at, _)) => format!("{}\u{2026}", &error[..at]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Record {:>3}/{:<3}  {}",
            red("✗"),
            position,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_probe_complete(&self, total: usize, loaded: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} depictions loaded", green("✔"), bold(&loaded.to_string()));
        } else {
            eprintln!(
                "{} {}/{} depictions loaded  ({} failed)",
                yellow("⚠"),
                bold(&loaded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # SMILES from a file, HTML page to stdout
  depict structures.smi > depictions.html

  # Pipe from stdin, black-on-white, double size
  cat structures.smi | depict --style bow --zoom 200 -o page.html

  # SD file against a remote service, verify every image loads
  depict --root-url https://example.org/cdkdepict --check library.sdf -o page.html

  # Just the URLs
  depict --format urls structures.smi

  # Highlight hydroxyls, CIP labels, JSON output
  depict --smarts '[OX2H]' --annotate cip --format json structures.smi

INPUT:
  One SMILES per line, optionally followed by a title after a space or tab.
  Blank lines and lines starting with '#' are skipped. Input containing a
  V2000/V3000 molfile with 'M  END' is read as CTAB blocks separated by '$$$$'.
  At most --max-records entries are rendered.

ENVIRONMENT VARIABLES:
  DEPICT_ROOT_URL         Depiction service root (default ".")
  DEPICT_STYLE            Default style (cow, cot, bow, bot, wob, wot, cob, nob)
  RUST_LOG                Override log filter (e.g. depict_board=debug)
"#;

/// Render SMILES / molfile text as chemical depictions.
#[derive(Parser, Debug)]
#[command(
    name = "depict",
    version,
    about = "Render SMILES / molfile text as chemical depictions",
    long_about = "Split pasted SMILES lines or SD-file CTAB blocks into records and build \
depiction URLs and an HTML results page against a CDK depiction service.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file. Reads stdin when absent or '-'.
    input: Option<PathBuf>,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "DEPICT_OUTPUT")]
    output: Option<PathBuf>,

    /// Depiction service root URL.
    #[arg(long, env = "DEPICT_ROOT_URL", default_value = ".")]
    root_url: String,

    /// Colour style.
    #[arg(long, env = "DEPICT_STYLE", default_value = "cow", value_parser = parse_option::<Style>)]
    style: Style,

    /// Atom annotation: none, number, mapidx, atomvalue, colmap, cip.
    #[arg(long, env = "DEPICT_ANNOTATE", value_parser = parse_option::<Annotation>)]
    annotate: Option<Annotation>,

    /// Zoom in percent.
    #[arg(long, env = "DEPICT_ZOOM")]
    zoom: Option<u32>,

    /// Zoom percentage the service uses by default (omitted from URLs).
    #[arg(long, env = "DEPICT_DEFAULT_ZOOM", default_value_t = DEFAULT_ZOOM)]
    default_zoom: u32,

    /// Mirror depictions horizontally.
    #[arg(long, env = "DEPICT_FLIP")]
    flip: bool,

    /// Rotate depictions by this many degrees.
    #[arg(long, env = "DEPICT_ROTATE", default_value_t = 0, allow_hyphen_values = true)]
    rotate: i32,

    /// SMARTS pattern to highlight.
    #[arg(long, env = "DEPICT_SMARTS", default_value = "")]
    smarts: String,

    /// Hydrogen display: provided, suppressed, stereo, bridgehead, explicit.
    #[arg(long, env = "DEPICT_HDISP", default_value = "bridgehead", value_parser = parse_option::<HydrogenDisplay>)]
    hdisp: HydrogenDisplay,

    /// Let the service draw titles inside the image.
    #[arg(long, env = "DEPICT_SHOW_TITLE")]
    show_title: bool,

    /// Abbreviations: off, groups, reagents, on.
    #[arg(long, env = "DEPICT_ABBR", default_value = "reagents", value_parser = parse_option::<Abbreviation>)]
    abbr: Abbreviation,

    /// Reaction arrow: equ, ngo, ret, res.
    #[arg(long, env = "DEPICT_ARROW", value_parser = parse_option::<ArrowStyle>)]
    arrow: Option<ArrowStyle>,

    /// Dative bonds: y (always), m (metals), n (never).
    #[arg(long, env = "DEPICT_DATIVE", default_value = "m", value_parser = parse_option::<DativeMode>)]
    dative: DativeMode,

    /// Maximum number of records rendered.
    #[arg(long, env = "DEPICT_MAX_RECORDS", default_value_t = MAX_RECORDS)]
    max_records: usize,

    /// Output: html, json, urls.
    #[arg(long, env = "DEPICT_FORMAT", value_enum, default_value = "html")]
    format: FormatArg,

    /// Probe every depiction and replace failures with the service's message.
    #[arg(long, env = "DEPICT_CHECK")]
    check: bool,

    /// Concurrent probes for --check.
    #[arg(short, long, env = "DEPICT_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Per-request timeout for --check in seconds.
    #[arg(long, env = "DEPICT_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "DEPICT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DEPICT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DEPICT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Html,
    Json,
    Urls,
}

fn parse_option<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr<Err = depict_board::DepictError>,
{
    s.parse().map_err(|e: depict_board::DepictError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar gives all the feedback that matters during --check,
    // so library INFO logs are hidden while it is active.
    let show_progress = cli.check && !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read input ───────────────────────────────────────────────────────
    let text = match cli.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => read_input(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    // ── Build options and config ─────────────────────────────────────────
    let options = build_options(&cli);
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn DepictProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Render ───────────────────────────────────────────────────────────
    let output = if cli.check {
        depict_checked(&text, options, &config)
            .await
            .context("Depiction check failed")?
    } else {
        depict(&text, options, &config)
    };

    if !cli.quiet {
        for warning in &output.warnings {
            eprintln!("{} {}", yellow("⚠"), warning);
        }
    }

    let rendered = render_output(&output, cli.format)?;

    // ── Write ────────────────────────────────────────────────────────────
    if let Some(ref path) = cli.output {
        write_output(path, &rendered)
            .await
            .context("Failed to write output")?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        let s = &output.stats;
        eprintln!(
            "{}  {} records  {}",
            if s.errored == 0 { green("✔") } else { yellow("⚠") },
            bold(&s.records.to_string()),
            dim(&format!(
                "{} molecules · {} reactions · {} schemes · {} skipped · {}ms",
                s.molecules, s.reactions, s.schemes, s.skipped, s.duration_ms
            )),
        );
        if let Some(ref path) = cli.output {
            eprintln!("   →  {}", bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `RenderOptions`.
fn build_options(cli: &Cli) -> RenderOptions {
    RenderOptions {
        style: cli.style,
        annotate: cli.annotate,
        zoom: cli.zoom,
        flip: cli.flip,
        rotate: cli.rotate,
        smarts: cli.smarts.clone(),
        hdisp: cli.hdisp,
        show_title: cli.show_title,
        abbr: cli.abbr,
        arrow: cli.arrow,
        dative: cli.dative,
    }
}

/// Map CLI args to `DepictConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DepictConfig> {
    let mut builder = DepictConfig::builder()
        .root_url(cli.root_url.clone())
        .max_records(cli.max_records)
        .default_zoom(cli.default_zoom)
        .concurrency(cli.concurrency)
        .timeout_secs(cli.timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn render_output(output: &RenderOutput, format: FormatArg) -> Result<String> {
    Ok(match format {
        FormatArg::Html => output.to_html(),
        FormatArg::Json => {
            let mut json =
                serde_json::to_string_pretty(output).context("Failed to serialise output")?;
            json.push('\n');
            json
        }
        FormatArg::Urls => output.url_list(),
    })
}
