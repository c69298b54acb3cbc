//! Artifact bookkeeping: image formats, output options and the per-run log of
//! written or failed files

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Chart file format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Svg,
    /// PNG and SVG
    Both,
}

impl ImageFormat {
    /// File extensions to write, in write order
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImageFormat::Png => &["png"],
            ImageFormat::Svg => &["svg"],
            ImageFormat::Both => &["png", "svg"],
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Both => "both",
        };
        f.write_str(name)
    }
}

/// What a run should write and where
#[derive(Debug, Clone)]
pub struct ArtifactOptions {
    pub output_dir: PathBuf,
    pub format: ImageFormat,
    pub charts: bool,
    pub report: bool,
}

impl ArtifactOptions {
    pub fn wants_output(&self) -> bool {
        self.charts || self.report
    }
}

/// One artifact that could not be produced
#[derive(Debug)]
pub struct ArtifactFailure {
    pub artifact: String,
    pub error: AnalysisError,
}

/// Files written during a run, plus the ones that failed
#[derive(Debug, Default)]
pub struct ArtifactLog {
    pub written: Vec<PathBuf>,
    pub failed: Vec<ArtifactFailure>,
}

impl ArtifactLog {
    pub fn record_written(&mut self, path: PathBuf) {
        log::info!("Saved {}", path.display());
        self.written.push(path);
    }

    pub fn record_failure(&mut self, artifact: impl Into<String>, error: AnalysisError) {
        let artifact = artifact.into();
        log::error!("Failed to generate {}: {}", artifact, error);
        self.failed.push(ArtifactFailure { artifact, error });
    }

    /// Record the outcome of a single-file artifact
    pub fn record(&mut self, artifact: impl Into<String>, outcome: Result<PathBuf>) {
        match outcome {
            Ok(path) => self.record_written(path),
            Err(e) => self.record_failure(artifact, e),
        }
    }

    pub fn merge(&mut self, other: ArtifactLog) {
        self.written.extend(other.written);
        self.failed.extend(other.failed);
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create the output directory if needed
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| AnalysisError::OutputWrite {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write a text artifact in one call
pub fn write_text(path: &Path, content: &str) -> Result<PathBuf> {
    std::fs::write(path, content).map_err(|source| AnalysisError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

/// Local timestamp for artifact names, e.g. `20250131_142501`
pub fn file_timestamp(pattern: &str) -> String {
    chrono::Local::now().format(pattern).to_string()
}

/// Local timestamp for report headers
pub fn report_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// File name of a path for display in reports
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
