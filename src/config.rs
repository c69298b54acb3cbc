//! Configuration system for the analysis toolkit

use crate::error::{AnalysisError, Result};
use crate::onsets::RoleNotes;
use crate::output::ImageFormat;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub roles: RoleNotes,
    pub sync: SyncConfig,
    pub trace: TraceConfig,
    pub gestures: GestureConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            roles: RoleNotes::default(),
            sync: SyncConfig::default(),
            trace: TraceConfig::default(),
            gestures: GestureConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Thresholds used when interpreting synchronisation results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Precision (std dev) upper bounds for excellent, good and moderate grades
    pub grade_thresholds_ms: [f64; 3],
    /// Offsets above this are reported as probable processing latency
    pub latency_warning_ms: f64,
    /// Precision or offset differences below this are treated as similar
    pub similarity_threshold_ms: f64,
    /// Mean deviation magnitude that triggers a calibration recommendation
    pub calibration_offset_ms: f64,
    /// Std dev that triggers a consistency recommendation
    pub consistency_warning_ms: f64,
    /// Fewer gesture events than this triggers a sample-size recommendation
    pub min_events_for_confidence: usize,
    /// Histogram range of the deviation chart
    pub histogram_range_ms: [f64; 2],
    /// Number of histogram bin edges
    pub histogram_edges: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            grade_thresholds_ms: [50.0, 100.0, 150.0],
            latency_warning_ms: 50.0,
            similarity_threshold_ms: 20.0,
            calibration_offset_ms: 20.0,
            consistency_warning_ms: 30.0,
            min_events_for_confidence: 10,
            histogram_range_ms: [-200.0, 200.0],
            histogram_edges: 30,
        }
    }
}

/// Chrome trace analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    pub target_fps: f64,
    /// Vsync events required (strictly more) before a refresh rate is reported
    pub min_vsync_events: usize,
    pub vsync_event_names: Vec<String>,
    pub frame_marker_name: String,
    pub user_timing_category: String,
    pub fallback_event_names: Vec<String>,
    /// Intervals longer than this are reported as frame drops
    pub frame_drop_interval_ms: f64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            target_fps: 30.0,
            min_vsync_events: 10,
            vsync_event_names: vec!["BeginFrame".to_string(), "FireAnimationFrame".to_string()],
            frame_marker_name: "frame-process".to_string(),
            user_timing_category: "blink.user_timing".to_string(),
            fallback_event_names: vec![
                "FunctionCall".to_string(),
                "EvaluateScript".to_string(),
                "v8.run".to_string(),
            ],
            frame_drop_interval_ms: 100.0,
        }
    }
}

/// Gesture plan defaults and detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Used when the plan omits `bpm`
    pub default_bpm: f64,
    /// Used when a gesture omits `attempts`
    pub default_attempts: u32,
    /// Detection-rate lower bounds for excellent, good and moderate assessments
    pub assessment_thresholds: [f64; 3],
    /// Note-axis range of the note_on section chart
    pub note_axis: [u8; 2],
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            default_bpm: 120.0,
            default_attempts: 16,
            assessment_thresholds: [0.8, 0.6, 0.4],
            note_axis: [20, 100],
        }
    }
}

/// Chart output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub image_format: ImageFormat,
    pub chart_size: [u32; 2],
    pub dashboard_size: [u32; 2],
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image_format: ImageFormat::Png,
            chart_size: [1200, 800],
            dashboard_size: [1500, 1200],
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> Result<()> {
    let roles = &config.roles;
    for (name, note) in [
        ("reference_note", roles.reference_note),
        ("gesture_note", roles.gesture_note),
        ("control_note", roles.control_note),
    ] {
        if note > 127 {
            return Err(AnalysisError::ConfigValidation(format!(
                "roles.{} must be a MIDI note (0-127), got {}",
                name, note
            )));
        }
    }
    if roles.reference_note == roles.gesture_note
        || roles.reference_note == roles.control_note
        || roles.gesture_note == roles.control_note
    {
        return Err(AnalysisError::ConfigValidation(
            "role notes must be distinct".to_string(),
        ));
    }

    let grades = config.sync.grade_thresholds_ms;
    if !(grades[0] < grades[1] && grades[1] < grades[2]) {
        return Err(AnalysisError::ConfigValidation(
            "sync.grade_thresholds_ms must be strictly ascending".to_string(),
        ));
    }

    let [lo, hi] = config.sync.histogram_range_ms;
    if lo >= hi || config.sync.histogram_edges < 2 {
        return Err(AnalysisError::ConfigValidation(
            "sync histogram needs min < max and at least 2 edges".to_string(),
        ));
    }

    if config.trace.target_fps <= 0.0 {
        return Err(AnalysisError::ConfigValidation(
            "trace.target_fps must be positive".to_string(),
        ));
    }

    if config.gestures.default_bpm <= 0.0 {
        return Err(AnalysisError::ConfigValidation(
            "gestures.default_bpm must be positive".to_string(),
        ));
    }

    let rates = config.gestures.assessment_thresholds;
    if !(rates[0] > rates[1] && rates[1] > rates[2]) {
        return Err(AnalysisError::ConfigValidation(
            "gestures.assessment_thresholds must be strictly descending".to_string(),
        ));
    }

    if config.gestures.note_axis[0] >= config.gestures.note_axis[1] {
        return Err(AnalysisError::ConfigValidation(
            "gestures.note_axis min must be < max".to_string(),
        ));
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::InputNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
