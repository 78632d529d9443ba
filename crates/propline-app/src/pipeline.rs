// End-to-end batch: projection files + screenshots -> ranked comparisons.
//
// Each stage boundary is a checkpoint. An empty stage emits an EmptyResult
// event and ends the run with no partial output.

use crate::config::Config;
use crate::ocr::OcrEngine;
use crate::report::{self, ReportError, ReportFormat};
use crate::sources;
use chrono::{DateTime, Utc};
use propline_core::clean::NameCleaner;
use propline_core::{
    compare, rank, ComparisonResult, Event, EventSink, LineBook, LineNormalizer, NameMatcher,
    PlayerProjection, ProjectionParser,
};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Projections,
    OcrText,
    Lines,
    Comparisons,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Projections => "no projections parsed",
            Stage::OcrText => "no OCR text obtained",
            Stage::Lines => "no lines normalized",
            Stage::Comparisons => "no comparisons produced",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("empty result: {0}")]
    Empty(Stage),

    #[error("invalid market phrase pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Intermediate counts kept for the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub projection_files: usize,
    pub players: usize,
    pub images: usize,
    pub ocr_texts: usize,
    pub lines: usize,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Ranked by |delta| descending.
    pub results: Vec<ComparisonResult>,
    pub stats: RunStats,
}

/// Run the full reconciliation for one configuration.
pub fn run(
    config: &Config,
    ocr: &dyn OcrEngine,
    sink: &mut dyn EventSink,
) -> Result<RunOutput, PipelineError> {
    let mut stats = RunStats::default();

    // 1. Projections
    let players = load_projections(config, sink, &mut stats);
    stats.players = players.len();
    checkpoint(players.is_empty(), Stage::Projections, sink)?;
    info!("Parsed {} player records from {} file(s)", players.len(), stats.projection_files);

    // 2. OCR
    let texts = extract_texts(config, ocr, sink, &mut stats);
    stats.ocr_texts = texts.len();
    checkpoint(texts.is_empty(), Stage::OcrText, sink)?;
    info!("Obtained OCR text for {} of {} image(s)", texts.len(), stats.images);

    // 3. Lines. Images are normalized independently so a header at the bottom
    // of one screenshot never pairs with data at the top of the next.
    let normalizer = LineNormalizer::new(&config.market.phrase)?;
    let mut book = LineBook::new();
    for text in &texts {
        book.merge(normalizer.normalize(text, sink));
    }
    stats.lines = book.len();
    checkpoint(book.is_empty(), Stage::Lines, sink)?;
    info!("Normalized {} distinct player line(s)", book.len());

    // 4. Compare and rank
    let matcher = NameMatcher::new(config.matching.steps.clone());
    let mut results = compare(&players, &book, &config.market, &matcher);
    checkpoint(results.is_empty(), Stage::Comparisons, sink)?;
    rank(&mut results);
    info!("Produced {} comparison(s)", results.len());

    Ok(RunOutput { results, stats })
}

/// Render and write the ranked results.
pub fn emit(
    results: &[ComparisonResult],
    format: ReportFormat,
    path: Option<&Path>,
    generated: Option<DateTime<Utc>>,
) -> Result<(), PipelineError> {
    let rendered = report::render(results, format, generated)?;
    report::write(&rendered, path)?;
    if let Some(path) = path {
        info!("Report written to {}", path.display());
    }
    Ok(())
}

fn checkpoint(empty: bool, stage: Stage, sink: &mut dyn EventSink) -> Result<(), PipelineError> {
    if empty {
        sink.emit(Event::empty(stage.to_string()));
        return Err(PipelineError::Empty(stage));
    }
    Ok(())
}

fn load_projections(
    config: &Config,
    sink: &mut dyn EventSink,
    stats: &mut RunStats,
) -> Vec<PlayerProjection> {
    let parser = ProjectionParser::new(
        config.schemas.clone(),
        NameCleaner::new(config.parser.noise_tokens.iter()),
    )
    .with_week(config.parser.week);

    let mut players = Vec::new();
    for path in config.projection_paths() {
        stats.projection_files += 1;
        match sources::read_projection_text(&path) {
            Ok(text) => {
                let parsed = parser.parse_text(&text, sink);
                debug!("{}: {} record(s)", path.display(), parsed.len());
                players.extend(parsed);
            }
            Err(e) => sink.emit(Event::unavailable(format!(
                "projection file {}: {e}",
                path.display()
            ))),
        }
    }
    players
}

fn extract_texts(
    config: &Config,
    ocr: &dyn OcrEngine,
    sink: &mut dyn EventSink,
    stats: &mut RunStats,
) -> Vec<String> {
    let dir = config.image_dir();
    let images = match sources::discover_images(&dir, &config.sources.image_extensions) {
        Ok(images) => images,
        Err(e) => {
            sink.emit(Event::unavailable(format!("image directory {}: {e}", dir.display())));
            return Vec::new();
        }
    };
    stats.images = images.len();

    let mut texts = Vec::with_capacity(images.len());
    for image in &images {
        match ocr.extract_text(image) {
            Ok(text) if text.trim().is_empty() => sink.emit(Event::unavailable(format!(
                "OCR recognized no text in {}",
                image.display()
            ))),
            Ok(text) => texts.push(text),
            Err(e) => sink.emit(Event::unavailable(e.to_string())),
        }
    }
    texts
}
