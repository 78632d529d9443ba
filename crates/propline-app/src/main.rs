// propline entry point.
//
// Startup sequence:
// 1. Parse CLI flags
// 2. Initialize tracing (stderr, or a log file)
// 3. Load config, apply CLI overrides
// 4. Build the OCR backend
// 5. Run the pipeline, emit the report

use propline_app::config;
use propline_app::ocr;
use propline_app::pipeline::{self, PipelineError};
use propline_app::report::ReportFormat;
use propline_core::events::CountingSink;
use propline_core::TracingSink;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Exit status when a stage produced nothing to report.
const EXIT_EMPTY: u8 = 2;

/// Compare weekly player projections against sportsbook lines read from
/// screenshots, ranked by the size of the edge.
#[derive(Debug, Parser)]
#[command(name = "propline", version, about)]
struct Args {
    /// Directory holding config/ and defaults/ (default: current directory)
    #[arg(long, env = "PROPLINE_ROOT")]
    root: Option<PathBuf>,

    /// Report format, overriding [output].format
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,

    /// Write the report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Screenshot directory, overriding [sources].image_dir
    #[arg(long)]
    image_dir: Option<String>,

    /// Projection export(s), overriding [sources].projection_files
    #[arg(long = "projections", num_args = 1..)]
    projections: Vec<String>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Prefix the text report with a generation timestamp
    #[arg(long)]
    timestamp: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(args.log_file.as_deref()) {
        eprintln!("propline: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(PipelineError::Empty(stage)) = e.downcast_ref::<PipelineError>() {
                error!("Nothing to report: {}", stage);
                eprintln!("propline: nothing to report ({stage})");
                return ExitCode::from(EXIT_EMPTY);
            }
            error!("{:#}", e);
            eprintln!("propline: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    info!("propline starting up");

    let mut config =
        config::load_config(args.root.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = args.image_dir {
        config.sources.image_dir = dir;
    }
    if !args.projections.is_empty() {
        config.sources.projection_files = args.projections;
    }
    info!(
        "Config loaded: {} projection file(s), images in {}, market {:?} -> {}, schema table v{} ({} positions)",
        config.sources.projection_files.len(),
        config.image_dir().display(),
        config.market.phrase,
        config.market.field,
        config.schemas.version(),
        config.schemas.positions().count()
    );

    let engine = ocr::from_config(&config.ocr);
    let mut sink = CountingSink::new(TracingSink);

    let output = pipeline::run(&config, engine.as_ref(), &mut sink)?;
    let stats = &output.stats;
    info!(
        "Run complete: {} player(s) from {} file(s), OCR text from {} of {} image(s), {} line(s)",
        stats.players,
        stats.projection_files,
        stats.ocr_texts,
        stats.images,
        stats.lines
    );
    info!(
        "{} result(s), {} warning(s), {} error event(s)",
        output.results.len(),
        sink.warnings(),
        sink.errors()
    );

    let format = args.format.unwrap_or(config.output.format);
    let path = args
        .output
        .or_else(|| config.output.path.as_deref().map(|p| config.resolve(p)));
    let generated = args.timestamp.then(chrono::Utc::now);

    pipeline::emit(&output.results, format, path.as_deref(), generated)
        .context("failed to write report")?;
    Ok(())
}

fn init_tracing(log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("propline=info,warn"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
        None => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
    }

    Ok(())
}
