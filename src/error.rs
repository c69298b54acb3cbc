//! Error types for the analysis toolkit

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading inputs, analysing them or writing artifacts
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// E001: Input path does not exist
    #[error("E001: Input file not found - {}", .0.display())]
    InputNotFound(PathBuf),
    /// E002: Input exists but could not be read
    #[error("E002: Failed to read {} - {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// E003: MIDI file could not be parsed or merged
    #[error("E003: Malformed MIDI file - {0}")]
    MalformedMidi(String),
    /// E004: Performance trace is not valid trace JSON
    #[error("E004: Malformed performance trace - {0}")]
    MalformedTrace(String),
    /// E005: Event table could not be parsed
    #[error("E005: Malformed event table - {0}")]
    MalformedEventTable(String),
    /// E006: Gesture plan could not be parsed
    #[error("E006: Malformed gesture plan - {0}")]
    MalformedPlan(String),
    /// E007: Not enough events to compute a statistic
    #[error("E007: Insufficient data - {0}")]
    InsufficientData(String),
    /// E008: Configuration validation failed
    #[error("E008: Configuration validation failed - {0}")]
    ConfigValidation(String),
    /// E009: Artifact could not be written
    #[error("E009: Failed to write {} - {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// E010: Chart backend failure
    #[error("E010: Chart rendering failed - {0}")]
    ChartRender(String),
    /// E011: Generic file I/O error
    #[error("E011: File I/O error - {0}")]
    Io(#[from] std::io::Error),
    /// E012: JSON (de)serialization error
    #[error("E012: JSON error - {0}")]
    Json(#[from] serde_json::Error),
    /// E013: CSV (de)serialization error
    #[error("E013: CSV error - {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
