//! Gesture detection analysis
//!
//! Checks how many of the gestures planned per beat window show up as MIDI
//! events in an exported event table.

use crate::charts::{
    self,
    gestures::{ControlSectionChart, NoteSectionChart},
};
use crate::config::{Config, GestureConfig};
use crate::error::{AnalysisError, Result};
use crate::events_table::{read_events_csv, EventRow};
use crate::output::{self, ArtifactLog, ArtifactOptions};
use crate::report;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Inclusive beat window of a gesture, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatRange {
    pub start: f64,
    pub end: f64,
}

impl BeatRange {
    /// `start-end` with integral beats printed without decimals
    pub fn label(&self) -> String {
        format!("{}-{}", beat_label(self.start), beat_label(self.end))
    }
}

fn beat_label(beat: f64) -> String {
    if beat.fract() == 0.0 && beat.abs() < 1e15 {
        format!("{}", beat as i64)
    } else {
        format!("{}", beat)
    }
}

/// MIDI event a gesture is expected to produce
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedMidi {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub control: Option<u8>,
}

/// Expected event kind, decoded from [`ExpectedMidi`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    NoteOn,
    ControlChange(Option<u8>),
    Unsupported,
}

impl ExpectedMidi {
    pub fn expectation(&self) -> Expectation {
        match self.event_type.as_deref() {
            Some("note_on") => Expectation::NoteOn,
            Some("control_change") => Expectation::ControlChange(self.control),
            _ => Expectation::Unsupported,
        }
    }

    pub fn type_name(&self) -> &str {
        self.event_type.as_deref().unwrap_or("unknown")
    }
}

/// One planned gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSpec {
    pub gesture: String,
    pub time_range_beats: BeatRange,
    #[serde(default)]
    pub expected_midi: ExpectedMidi,
    #[serde(default)]
    pub attempts: Option<u32>,
}

impl GestureSpec {
    pub fn short_name(&self) -> &str {
        short_gesture_name(&self.gesture)
    }
}

/// Part of a gesture name after `" - "`, or the whole name
pub fn short_gesture_name(name: &str) -> &str {
    name.split_once(" - ").map(|(_, rest)| rest).unwrap_or(name)
}

/// Test plan: tempo and the gestures performed per beat window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GesturePlan {
    #[serde(default)]
    pub bpm: Option<f64>,
    #[serde(default)]
    pub gestures: Vec<GestureSpec>,
}

/// Load and check a gesture plan
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<GesturePlan> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::InputNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| AnalysisError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    let plan: GesturePlan =
        serde_json::from_str(&content).map_err(|e| AnalysisError::MalformedPlan(e.to_string()))?;
    if let Some(bpm) = plan.bpm {
        if !(bpm > 0.0) {
            return Err(AnalysisError::MalformedPlan(format!("bpm must be positive, got {}", bpm)));
        }
    }
    Ok(plan)
}

/// Absolute time window of a section in seconds, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub start_s: f64,
    pub end_s: f64,
}

impl TimeWindow {
    /// Map beats to seconds: beat `b` starts at `offset + (b - 1) * 60 / bpm`
    pub fn from_beats(beats: &BeatRange, offset_s: f64, bpm: f64) -> Self {
        let beat_s = 60.0 / bpm;
        Self {
            start_s: offset_s + (beats.start - 1.0) * beat_s,
            end_s: offset_s + (beats.end - 1.0) * beat_s,
        }
    }

    pub fn contains(&self, time_s: f64) -> bool {
        time_s >= self.start_s && time_s <= self.end_s
    }
}

/// Notes seen in a note_on section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteStats {
    /// Distinct notes in first-seen order
    pub notes: Vec<u8>,
    pub min_note: u8,
    pub max_note: u8,
}

/// Value statistics of a control-change section
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlStats {
    pub min_value: u8,
    pub max_value: u8,
    pub mean_value: f64,
    pub std_value: f64,
    /// Share of the 0-127 range covered, in percent
    pub coverage_pct: f64,
}

impl ControlStats {
    pub fn from_values(values: &[u8]) -> Option<Self> {
        let min_value = *values.iter().min()?;
        let max_value = *values.iter().max()?;
        let as_f64: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
        Some(Self {
            min_value,
            max_value,
            mean_value: stats::mean(&as_f64),
            std_value: stats::std_dev(&as_f64),
            coverage_pct: f64::from(max_value - min_value) / 127.0 * 100.0,
        })
    }
}

/// Detected value changes; a constant run counts once
pub fn value_changes(values: &[u8]) -> usize {
    if values.is_empty() {
        return 0;
    }
    values.windows(2).filter(|w| w[0] != w[1]).count() + 1
}

/// What was measured for a gesture, by expected event kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DetectionDetail {
    Notes(Option<NoteStats>),
    Control {
        control: u8,
        stats: Option<ControlStats>,
    },
    /// Control change without a control number
    MissingControl,
    Unsupported,
}

/// Detection result of one planned gesture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GestureDetection {
    pub gesture_name: String,
    pub event_type: String,
    pub expected_attempts: u32,
    pub detected_events: usize,
    /// 0..=1
    pub detection_rate: f64,
    pub detail: DetectionDetail,
    /// (time, note) or (time, value) of the matching events
    #[serde(skip)]
    pub points: Vec<(f64, f64)>,
}

fn rate(count: usize, attempts: u32) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        count as f64 / f64::from(attempts)
    }
}

impl GestureDetection {
    fn empty(spec: &GestureSpec, attempts: u32, detail: DetectionDetail) -> Self {
        Self {
            gesture_name: spec.gesture.clone(),
            event_type: spec.expected_midi.type_name().to_string(),
            expected_attempts: attempts,
            detected_events: 0,
            detection_rate: 0.0,
            detail,
            points: Vec::new(),
        }
    }

    fn notes(spec: &GestureSpec, attempts: u32, rows: &[&EventRow]) -> Self {
        let note_rows: Vec<&EventRow> = rows.iter().copied().filter(|r| r.is_type("note_on")).collect();
        let mut notes: Vec<u8> = Vec::new();
        for note in note_rows.iter().filter_map(|r| r.note) {
            if !notes.contains(&note) {
                notes.push(note);
            }
        }
        let stats = match (notes.iter().min(), notes.iter().max()) {
            (Some(&min_note), Some(&max_note)) => Some(NoteStats {
                notes: notes.clone(),
                min_note,
                max_note,
            }),
            _ => None,
        };

        Self {
            detected_events: note_rows.len(),
            detection_rate: rate(note_rows.len(), attempts),
            detail: DetectionDetail::Notes(stats),
            points: note_rows
                .iter()
                .filter_map(|r| r.note.map(|n| (r.time(), f64::from(n))))
                .collect(),
            ..Self::empty(spec, attempts, DetectionDetail::Unsupported)
        }
    }

    fn control(spec: &GestureSpec, attempts: u32, control: u8, rows: &[&EventRow]) -> Self {
        let cc_rows: Vec<&EventRow> = rows
            .iter()
            .copied()
            .filter(|r| r.is_type("control_change") && r.control == Some(control))
            .collect();
        let values: Vec<u8> = cc_rows.iter().filter_map(|r| r.value).collect();
        let detection_rate = if values.is_empty() || attempts == 0 {
            0.0
        } else {
            rate(value_changes(&values), attempts).min(1.0)
        };

        Self {
            detected_events: cc_rows.len(),
            detection_rate,
            detail: DetectionDetail::Control {
                control,
                stats: ControlStats::from_values(&values),
            },
            points: cc_rows
                .iter()
                .filter_map(|r| r.value.map(|v| (r.time(), f64::from(v))))
                .collect(),
            ..Self::empty(spec, attempts, DetectionDetail::Unsupported)
        }
    }

    pub fn control_number(&self) -> Option<u8> {
        match self.detail {
            DetectionDetail::Control { control, .. } => Some(control),
            _ => None,
        }
    }
}

/// A beat window holding a single gesture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleSection {
    /// 1-based position of the gesture in the plan
    pub section_index: usize,
    pub beats: BeatRange,
    pub window: TimeWindow,
    pub total_events: usize,
    pub detection: GestureDetection,
}

/// A beat window shared by several gestures performed together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimultaneousSection {
    pub name: String,
    pub beats: BeatRange,
    pub window: TimeWindow,
    pub total_events: usize,
    pub subsections: Vec<GestureDetection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SectionAnalysis {
    Single(SingleSection),
    Simultaneous(SimultaneousSection),
}

impl SectionAnalysis {
    /// Every gesture detection of the section
    pub fn detections(&self) -> Vec<&GestureDetection> {
        match self {
            SectionAnalysis::Single(s) => vec![&s.detection],
            SectionAnalysis::Simultaneous(s) => s.subsections.iter().collect(),
        }
    }
}

/// Aggregate detection figures over all sections
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub total_planned_attempts: u64,
    pub average_detection_rate: f64,
    pub best_detection_rate: f64,
    pub worst_detection_rate: f64,
    pub sections_analyzed: usize,
}

impl DetectionSummary {
    pub fn from_sections(sections: &[SectionAnalysis]) -> Self {
        let detections: Vec<&GestureDetection> =
            sections.iter().flat_map(|s| s.detections()).collect();
        let rates: Vec<f64> = detections.iter().map(|d| d.detection_rate).collect();
        Self {
            total_planned_attempts: detections.iter().map(|d| u64::from(d.expected_attempts)).sum(),
            average_detection_rate: stats::mean(&rates),
            best_detection_rate: stats::max(&rates).unwrap_or(0.0),
            worst_detection_rate: stats::min(&rates).unwrap_or(0.0),
            sections_analyzed: sections.len(),
        }
    }
}

/// Result of a gesture detection run
#[derive(Debug, Clone, Serialize)]
pub struct GestureAnalysis {
    pub events_file: PathBuf,
    pub plan_file: PathBuf,
    pub bpm: f64,
    pub total_events: usize,
    pub total_duration_s: f64,
    pub sections: Vec<SectionAnalysis>,
    pub summary: DetectionSummary,
}

/// Group plan entries by identical beat range, in first-seen order
pub fn group_by_beats(gestures: &[GestureSpec]) -> Vec<Vec<(usize, &GestureSpec)>> {
    let mut groups: Vec<Vec<(usize, &GestureSpec)>> = Vec::new();
    for (i, spec) in gestures.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|g| g[0].1.time_range_beats == spec.time_range_beats)
        {
            Some(group) => group.push((i, spec)),
            None => groups.push(vec![(i, spec)]),
        }
    }
    groups
}

/// Gesture detection pipeline
pub struct GestureAnalyzer {
    config: Config,
}

impl GestureAnalyzer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn analyze_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        events_csv: P,
        plan_json: Q,
    ) -> Result<GestureAnalysis> {
        let rows = read_events_csv(events_csv.as_ref())?;
        let plan = load_plan(plan_json.as_ref())?;
        Ok(self.analyze_rows(&rows, &plan, events_csv.as_ref(), plan_json.as_ref()))
    }

    pub fn analyze_rows(
        &self,
        rows: &[EventRow],
        plan: &GesturePlan,
        events_file: &Path,
        plan_file: &Path,
    ) -> GestureAnalysis {
        let settings: &GestureConfig = &self.config.gestures;
        let bpm = plan.bpm.unwrap_or(settings.default_bpm);
        let times: Vec<f64> = rows.iter().map(EventRow::time).collect();
        let first = stats::min(&times).unwrap_or(0.0);
        let last = stats::max(&times).unwrap_or(0.0);
        let attempts_of = |spec: &GestureSpec| spec.attempts.unwrap_or(settings.default_attempts);

        let mut sections = Vec::new();
        for group in group_by_beats(&plan.gestures) {
            let beats = group[0].1.time_range_beats;
            let window = TimeWindow::from_beats(&beats, first, bpm);
            let in_window: Vec<&EventRow> = rows.iter().filter(|r| window.contains(r.time())).collect();

            if let [(index, spec)] = group.as_slice() {
                let attempts = attempts_of(spec);
                let detection = match spec.expected_midi.expectation() {
                    Expectation::NoteOn => GestureDetection::notes(spec, attempts, &in_window),
                    Expectation::ControlChange(Some(control)) => {
                        GestureDetection::control(spec, attempts, control, &in_window)
                    }
                    Expectation::ControlChange(None) => {
                        GestureDetection::empty(spec, attempts, DetectionDetail::MissingControl)
                    }
                    Expectation::Unsupported => {
                        GestureDetection::empty(spec, attempts, DetectionDetail::Unsupported)
                    }
                };
                sections.push(SectionAnalysis::Single(SingleSection {
                    section_index: index + 1,
                    beats,
                    window,
                    total_events: in_window.len(),
                    detection,
                }));
            } else {
                let subsections = group
                    .iter()
                    .map(|(_, spec)| {
                        let attempts = attempts_of(spec);
                        match spec.expected_midi.expectation() {
                            Expectation::ControlChange(Some(control)) => {
                                GestureDetection::control(spec, attempts, control, &in_window)
                            }
                            Expectation::ControlChange(None) => {
                                GestureDetection::empty(spec, attempts, DetectionDetail::MissingControl)
                            }
                            _ => GestureDetection::empty(spec, attempts, DetectionDetail::Unsupported),
                        }
                    })
                    .collect();
                let names: Vec<&str> = group.iter().map(|(_, spec)| spec.short_name()).collect();
                sections.push(SectionAnalysis::Simultaneous(SimultaneousSection {
                    name: format!("Simultaneous: {}", names.join(" + ")),
                    beats,
                    window,
                    total_events: in_window.len(),
                    subsections,
                }));
            }
        }

        let summary = DetectionSummary::from_sections(&sections);
        log::info!(
            "Analysed {} sections, average detection rate {:.1}%",
            summary.sections_analyzed,
            summary.average_detection_rate * 100.0
        );

        GestureAnalysis {
            events_file: events_file.to_path_buf(),
            plan_file: plan_file.to_path_buf(),
            bpm,
            total_events: rows.len(),
            total_duration_s: last - first,
            sections,
            summary,
        }
    }

    /// Write section charts and the detection report requested by `options`
    pub fn export(&self, analysis: &GestureAnalysis, options: &ArtifactOptions) -> ArtifactLog {
        let mut artifacts = ArtifactLog::default();
        if !options.wants_output() {
            return artifacts;
        }
        if let Err(e) = output::ensure_dir(&options.output_dir) {
            artifacts.record_failure("output directory", e);
            return artifacts;
        }

        if options.charts {
            for section in &analysis.sections {
                artifacts.merge(self.export_section(section, options));
            }
        }

        if options.report {
            let content = report::gestures::render(analysis, &self.config.gestures);
            let path = options.output_dir.join(format!(
                "detection_analysis_{}.md",
                output::file_timestamp("%Y%m%d_%H%M%S")
            ));
            artifacts.record("detection report", output::write_text(&path, &content));
        }

        artifacts
    }

    fn export_section(&self, section: &SectionAnalysis, options: &ArtifactOptions) -> ArtifactLog {
        let size = self.config.output.chart_size;
        let size = (size[0], size[1]);

        match section {
            SectionAnalysis::Single(single) => {
                let detection = &single.detection;
                let stem = options.output_dir.join(format!(
                    "section_{}_{}",
                    single.section_index,
                    safe_name(&detection.gesture_name)
                ));
                match &detection.detail {
                    DetectionDetail::Notes(_) if !detection.points.is_empty() => {
                        let chart = NoteSectionChart::new(single, self.config.gestures.note_axis);
                        charts::save_chart(&chart, &stem, options.format, size)
                    }
                    DetectionDetail::Notes(_) => {
                        log::warn!(
                            "Section \"{}\" skipped as it contains no note_on events",
                            detection.gesture_name
                        );
                        ArtifactLog::default()
                    }
                    DetectionDetail::Control { control, .. } if detection.points.is_empty() => {
                        log::warn!(
                            "Section \"{}\" skipped as it contains no CC{} events",
                            detection.gesture_name,
                            control
                        );
                        ArtifactLog::default()
                    }
                    DetectionDetail::Control { .. } => {
                        let chart = ControlSectionChart::single(single);
                        charts::save_chart(&chart, &stem, options.format, size)
                    }
                    DetectionDetail::MissingControl => {
                        log::warn!(
                            "Section \"{}\" skipped: no control number specified",
                            detection.gesture_name
                        );
                        ArtifactLog::default()
                    }
                    DetectionDetail::Unsupported => {
                        log::warn!(
                            "Section \"{}\" skipped: unknown expected MIDI type",
                            detection.gesture_name
                        );
                        ArtifactLog::default()
                    }
                }
            }
            SectionAnalysis::Simultaneous(simultaneous) => {
                let chart = ControlSectionChart::simultaneous(simultaneous);
                if chart.is_empty() {
                    log::warn!("Simultaneous sections skipped: no control change data found");
                    return ArtifactLog::default();
                }
                let stem = options.output_dir.join(format!(
                    "section_simultaneous_beats_{}",
                    simultaneous.beats.label()
                ));
                charts::save_chart(&chart, &stem, options.format, size)
            }
        }
    }
}

/// File-name friendly gesture name
pub fn safe_name(name: &str) -> String {
    name.replace([' ', '/'], "_").to_lowercase()
}

/// Console summary of detection rates
pub fn print_detection_summary(analysis: &GestureAnalysis) {
    println!("=== Gesture Detection ===");
    for section in &analysis.sections {
        for detection in section.detections() {
            println!(
                "{:<40} {:>4} detected / {:>3} planned  ({:.1}%)",
                detection.gesture_name,
                detection.detected_events,
                detection.expected_attempts,
                detection.detection_rate * 100.0
            );
        }
    }
    let s = &analysis.summary;
    println!(
        "\nAverage detection rate: {:.1}% (best {:.1}%, worst {:.1}%)",
        s.average_detection_rate * 100.0,
        s.best_detection_rate * 100.0,
        s.worst_detection_rate * 100.0
    );
}
