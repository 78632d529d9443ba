// Configuration loading and parsing (propline.toml, schemas.toml).

use crate::report::ReportFormat;
use propline_core::{FoldStep, LineNormalizer, Market, PositionSchemaTable, SchemaError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_FILE: &str = "propline.toml";
pub const SCHEMAS_FILE: &str = "schemas.toml";

/// Files `ensure_config_files` seeds from `defaults/`.
pub const SEEDED_FILES: &[&str] = &[CONFIG_FILE, SCHEMAS_FILE];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid schema table {path}: {source}")]
    SchemaError { path: PathBuf, source: SchemaError },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that relative paths in the config are resolved against.
    pub base_dir: PathBuf,
    pub sources: SourcesConfig,
    pub parser: ParserConfig,
    pub market: Market,
    pub ocr: OcrConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
    pub schemas: PositionSchemaTable,
}

impl Config {
    /// Resolve a config path against the base directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn projection_paths(&self) -> Vec<PathBuf> {
        self.sources
            .projection_files
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    pub fn image_dir(&self) -> PathBuf {
        self.resolve(&self.sources.image_dir)
    }
}

// ---------------------------------------------------------------------------
// propline.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire propline.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ProplineFile {
    sources: SourcesConfig,
    #[serde(default)]
    parser: ParserConfig,
    #[serde(default)]
    market: Market,
    #[serde(default)]
    ocr: OcrConfig,
    #[serde(default)]
    matching: MatchingConfig,
    #[serde(default)]
    output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub projection_files: Vec<String>,
    pub image_dir: String,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "tiff", "bmp", "gif"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_noise_tokens")]
    pub noise_tokens: Vec<String>,
    /// Pin the `WEEK <N> PROJECTIONS` marker to one week. Any week when unset.
    #[serde(default)]
    pub week: Option<u32>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            noise_tokens: default_noise_tokens(),
            week: None,
        }
    }
}

fn default_noise_tokens() -> Vec<String> {
    propline_core::clean::DEFAULT_NOISE_TOKENS
        .iter()
        .map(|t| t.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngineKind {
    #[default]
    Tesseract,
    Sidecar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    #[serde(default)]
    pub engine: OcrEngineKind,
    #[serde(default = "default_ocr_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        OcrConfig {
            engine: OcrEngineKind::default(),
            command: default_ocr_command(),
            args: Vec::new(),
        }
    }
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub steps: Vec<FoldStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/propline.toml` and
/// (optionally) `config/schemas.toml`, relative to `base_dir`. Without a
/// schemas file the built-in RB/WR/TE/QB table is used.
///
/// This does not auto-copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- propline.toml (required) ---
    let main_path = config_dir.join(CONFIG_FILE);
    let main_text = read_file(&main_path)?;
    let file: ProplineFile = toml::from_str(&main_text).map_err(|e| ConfigError::ParseError {
        path: main_path.clone(),
        source: e,
    })?;

    // --- schemas.toml (optional) ---
    let schemas_path = config_dir.join(SCHEMAS_FILE);
    let schemas = if schemas_path.exists() {
        let text = read_file(&schemas_path)?;
        PositionSchemaTable::from_toml_str(&text).map_err(|e| ConfigError::SchemaError {
            path: schemas_path.clone(),
            source: e,
        })?
    } else {
        PositionSchemaTable::default()
    };

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        sources: file.sources,
        parser: file.parser,
        market: file.market,
        ocr: file.ocr,
        matching: file.matching,
        output: file.output,
        schemas,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed any of `propline.toml` / `schemas.toml` missing from `config/` with
/// the copy in `defaults/`. Existing files are never overwritten. Returns the
/// files that were written, in seeding order.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.join(CONFIG_FILE).is_file() {
            return Ok(vec![]);
        }
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no defaults/ directory and no config/{CONFIG_FILE} in {}; \
                 run from the project root or pass --root",
                base_dir.display()
            ),
        });
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for name in SEEDED_FILES {
        let source = defaults_dir.join(name);
        if !source.is_file() {
            continue;
        }
        let target = config_dir.join(name);
        if seed_file(&source, &target)? {
            info!("Seeded {} from defaults", target.display());
            copied.push(target);
        }
    }
    Ok(copied)
}

/// Copy `source` to `target` unless `target` already exists. Create-new
/// semantics, so a file created concurrently is left alone.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let copy_error = |what: &str, path: &Path, e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to {what} {}: {e}", path.display()),
    };

    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(dest) => dest,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(copy_error("create", target, e)),
    };
    let mut src = std::fs::File::open(source).map_err(|e| copy_error("read", source, e))?;
    std::io::copy(&mut src, &mut dest).map_err(|e| copy_error("write", target, e))?;
    Ok(true)
}

/// Seed missing config files from defaults, then load. Uses the current
/// working directory when `root` is `None`.
pub fn load_config(root: Option<&Path>) -> Result<Config, ConfigError> {
    let base_dir = match root {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
            path: PathBuf::from("."),
        })?,
    };
    ensure_config_files(&base_dir)?;
    load_config_from(&base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    // Sources
    let sources = &config.sources;
    if sources.projection_files.is_empty() {
        return Err(invalid("sources.projection_files", "must list at least one file"));
    }
    if sources.projection_files.iter().any(|p| p.trim().is_empty()) {
        return Err(invalid("sources.projection_files", "paths must not be empty"));
    }
    if sources.image_dir.trim().is_empty() {
        return Err(invalid("sources.image_dir", "must not be empty"));
    }
    if sources.image_extensions.is_empty() {
        return Err(invalid("sources.image_extensions", "must list at least one extension"));
    }
    for ext in &sources.image_extensions {
        if ext.is_empty() || ext.starts_with('.') {
            return Err(invalid(
                "sources.image_extensions",
                format!("extensions are bare names like \"png\", got \"{ext}\""),
            ));
        }
    }

    // Parser
    if config.parser.noise_tokens.iter().any(|t| t.is_empty()) {
        return Err(invalid("parser.noise_tokens", "tokens must not be empty"));
    }
    if config.parser.week == Some(0) {
        return Err(invalid("parser.week", "must be greater than 0"));
    }

    // Market
    if config.market.phrase.trim().is_empty() {
        return Err(invalid("market.phrase", "must not be empty"));
    }
    if let Err(e) = LineNormalizer::new(&config.market.phrase) {
        return Err(invalid("market.phrase", format!("cannot build pattern: {e}")));
    }
    let field_known = config
        .schemas
        .positions()
        .filter_map(|pos| config.schemas.schema(pos))
        .any(|fields| fields.iter().any(|f| f == &config.market.field));
    if !field_known {
        return Err(invalid(
            "market.field",
            format!("`{}` is not a field of any position schema", config.market.field),
        ));
    }

    // OCR
    if config.ocr.engine == OcrEngineKind::Tesseract && config.ocr.command.trim().is_empty() {
        return Err(invalid("ocr.command", "must not be empty for the tesseract engine"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
