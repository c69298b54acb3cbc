//! Gesture/music synchronisation analysis
//!
//! Measures how far gesture (Web Theremin) and control (MIDI keyboard) onsets
//! land from the nearest metronome click.

use crate::charts::{self, sync::SyncDashboard};
use crate::config::Config;
use crate::deviation::{deviations, DeviationExtremes, PrecisionMetrics};
use crate::error::Result;
use crate::midi::{read_midi_file, TimedMessage};
use crate::onsets::{extract_onsets, OnsetSets, Role};
use crate::output::{self, ArtifactLog, ArtifactOptions};
use crate::report;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Deviation analysis of one role against the reference
#[derive(Debug, Clone, Serialize)]
pub struct RoleAnalysis {
    pub role: Role,
    pub deviations_ms: Vec<f64>,
    pub metrics: PrecisionMetrics,
    pub extremes: Option<DeviationExtremes>,
}

impl RoleAnalysis {
    pub fn new(role: Role, source: &[f64], reference: &[f64]) -> Self {
        let deviations_ms = deviations(source, reference);
        let metrics = PrecisionMetrics::from_deviations(&deviations_ms);
        let extremes = DeviationExtremes::from_deviations(&deviations_ms);
        Self {
            role,
            deviations_ms,
            metrics,
            extremes,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.deviations_ms.is_empty()
    }
}

/// Which role came out ahead on a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Winner {
    Gesture,
    Control,
}

/// Gesture vs control comparison; present only when both roles have data
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncComparison {
    pub gesture_precision_ms: f64,
    pub control_precision_ms: f64,
    pub precision_difference_ms: f64,
    /// Smaller precision over larger precision, as a percentage
    pub relative_efficiency_pct: f64,
    pub gesture_abs_offset_ms: f64,
    pub control_abs_offset_ms: f64,
    pub offset_difference_ms: f64,
    pub better_precision: Winner,
    pub smaller_offset: Winner,
}

impl SyncComparison {
    pub fn new(gesture: &PrecisionMetrics, control: &PrecisionMetrics) -> Self {
        let gp = gesture.real_precision_ms;
        let cp = control.real_precision_ms;
        let go = gesture.offset_ms.abs();
        let co = control.offset_ms.abs();

        let relative_efficiency_pct = if gp.max(cp) > 0.0 {
            gp.min(cp) / gp.max(cp) * 100.0
        } else {
            100.0
        };

        Self {
            gesture_precision_ms: gp,
            control_precision_ms: cp,
            precision_difference_ms: (gp - cp).abs(),
            relative_efficiency_pct,
            gesture_abs_offset_ms: go,
            control_abs_offset_ms: co,
            offset_difference_ms: (go - co).abs(),
            better_precision: if gp < cp { Winner::Gesture } else { Winner::Control },
            smaller_offset: if go < co { Winner::Gesture } else { Winner::Control },
        }
    }

    /// Precision difference relative to the control role's precision, as a percentage
    pub fn improvement_pct(&self) -> f64 {
        if self.control_precision_ms > 0.0 {
            self.precision_difference_ms / self.control_precision_ms * 100.0
        } else {
            0.0
        }
    }
}

/// Full synchronisation result of one MIDI capture
#[derive(Debug, Clone, Serialize)]
pub struct SyncAnalysis {
    pub source_file: PathBuf,
    pub onsets: OnsetSets,
    pub gesture: RoleAnalysis,
    pub control: RoleAnalysis,
    pub comparison: Option<SyncComparison>,
}

/// Synchronisation pipeline: extraction, deviation, metrics, artifacts
pub struct SyncAnalyzer {
    config: Config,
}

impl SyncAnalyzer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read a MIDI capture and analyse it
    pub fn analyze_file<P: AsRef<Path>>(&self, midi_path: P) -> Result<SyncAnalysis> {
        let midi_path = midi_path.as_ref();
        let messages = read_midi_file(midi_path)?;
        Ok(self.analyze_messages(midi_path, &messages))
    }

    /// Analyse an already flattened message stream
    pub fn analyze_messages(&self, source_file: &Path, messages: &[TimedMessage]) -> SyncAnalysis {
        let onsets = extract_onsets(messages, &self.config.roles);
        log::info!(
            "Events found: reference ({}), gesture ({}), control ({})",
            onsets.reference.len(),
            onsets.gesture.len(),
            onsets.control.len()
        );

        let gesture = RoleAnalysis::new(Role::Gesture, &onsets.gesture, &onsets.reference);
        let control = RoleAnalysis::new(Role::Control, &onsets.control, &onsets.reference);
        let comparison = (gesture.has_data() && control.has_data())
            .then(|| SyncComparison::new(&gesture.metrics, &control.metrics));

        SyncAnalysis {
            source_file: source_file.to_path_buf(),
            onsets,
            gesture,
            control,
            comparison,
        }
    }

    /// Write the chart(s) and Markdown report requested by `options`
    pub fn export(&self, analysis: &SyncAnalysis, options: &ArtifactOptions) -> ArtifactLog {
        let mut artifacts = ArtifactLog::default();
        if !options.wants_output() {
            return artifacts;
        }
        if let Err(e) = output::ensure_dir(&options.output_dir) {
            artifacts.record_failure("output directory", e);
            return artifacts;
        }
        log::info!("Using output directory: {}", options.output_dir.display());

        let stem = options
            .output_dir
            .join(format!("sync_analysis_{}", output::file_timestamp("%Y%m%d_%H%M%S")));

        if options.charts {
            let dashboard = SyncDashboard::new(analysis, &self.config);
            let size = self.config.output.dashboard_size;
            artifacts.merge(charts::save_chart(&dashboard, &stem, options.format, (size[0], size[1])));
        }

        if options.report {
            let content = report::sync::render(analysis, &self.config);
            let path = stem.with_extension("md");
            artifacts.record("sync report", output::write_text(&path, &content));
        }

        artifacts
    }
}

/// Console summary of one role
pub fn print_role_summary(title: &str, analysis: &RoleAnalysis) {
    println!("--- Results for: {} ---", title);
    match analysis.extremes {
        None => println!("No events found for analysis."),
        Some(extremes) => {
            let m = &analysis.metrics;
            println!("  - Mean deviation (absolute): {:.2} ms", m.mean_absolute_deviation_ms);
            println!(
                "  - Mean deviation (signed):   {:.2} ms (positive = late, negative = early)",
                m.offset_ms
            );
            println!("  - Standard deviation:        {:.2} ms", m.real_precision_ms);
            println!("  - Minimum deviation (earliest): {:.2} ms", extremes.earliest_ms);
            println!("  - Maximum deviation (latest):   {:.2} ms", extremes.latest_ms);
        }
    }
    println!("{}\n", "-".repeat(title.len() + 18));
}
