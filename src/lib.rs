//! Web Theremin Analysis Toolkit
//!
//! Offline analysis of Web Theremin experiment captures: gesture/music timing
//! synchronisation from MIDI recordings, gesture detection against a test plan,
//! and frame-rate analysis of Chrome performance traces.

pub mod charts;
pub mod config;
pub mod deviation;
pub mod error;
pub mod events_table;
pub mod gestures;
pub mod midi;
pub mod onsets;
pub mod output;
pub mod report;
pub mod stats;
pub mod sync;
pub mod trace;

pub use config::Config;
pub use deviation::{deviations, nearest_reference_index, PrecisionMetrics};
pub use error::{AnalysisError, Result};
pub use gestures::GestureAnalyzer;
pub use midi::{MessageKind, TimedMessage};
pub use onsets::{extract_onsets, OnsetSets, RoleNotes};
pub use output::{ArtifactLog, ArtifactOptions, ImageFormat};
pub use sync::SyncAnalyzer;
pub use trace::TraceAnalyzer;

use std::path::Path;

/// Check that every input file exists and the configuration is valid
pub fn validate_input<P: AsRef<Path>>(inputs: &[P], config: &Config) -> Result<()> {
    for input in inputs {
        let input = input.as_ref();
        if !input.is_file() {
            return Err(AnalysisError::InputNotFound(input.to_path_buf()));
        }
    }

    config::validate_config(config)?;

    Ok(())
}
