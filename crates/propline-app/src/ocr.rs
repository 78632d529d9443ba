// OCR backends for sportsbook screenshots.

use crate::config::{OcrConfig, OcrEngineKind};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Suffix appended to an image path to find its captured OCR text.
pub const SIDECAR_SUFFIX: &str = "txt";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to launch OCR command `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("OCR failed for {path} ({status}): {stderr}")]
    Failed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("failed to read OCR text for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Turns one image into raw text. Implementations must not panic on bad
/// images; every failure is an `OcrError`.
pub trait OcrEngine {
    fn extract_text(&self, image: &Path) -> Result<String, OcrError>;
}

/// Shells out to the `tesseract` CLI, which prints recognized text on stdout
/// when given `stdout` as its output base.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    args: Vec<String>,
}

impl TesseractCli {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        TesseractCli {
            command: command.into(),
            args,
        }
    }
}

impl OcrEngine for TesseractCli {
    fn extract_text(&self, image: &Path) -> Result<String, OcrError> {
        debug!("Running {} on {}", self.command, image.display());
        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .args(&self.args)
            .output()
            .map_err(|e| OcrError::Spawn {
                command: self.command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                path: image.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Replays text captured earlier: `shot.png` is read from `shot.png.txt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarText;

impl SidecarText {
    pub fn sidecar_path(image: &Path) -> PathBuf {
        let mut name = image.as_os_str().to_os_string();
        name.push(".");
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }
}

impl OcrEngine for SidecarText {
    fn extract_text(&self, image: &Path) -> Result<String, OcrError> {
        let path = Self::sidecar_path(image);
        std::fs::read_to_string(&path).map_err(|e| OcrError::Io { path, source: e })
    }
}

/// Build the configured backend.
pub fn from_config(config: &OcrConfig) -> Box<dyn OcrEngine> {
    match config.engine {
        OcrEngineKind::Tesseract => {
            Box::new(TesseractCli::new(config.command.clone(), config.args.clone()))
        }
        OcrEngineKind::Sidecar => Box::new(SidecarText),
    }
}
