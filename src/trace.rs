//! Chrome DevTools performance-trace FPS analysis
//!
//! Frame timestamps come from `frame-process` User Timing marks when the page
//! emitted them, otherwise from generic script-execution events.

use crate::charts::{
    self,
    trace::{FpsBuckets, FpsDistributionChart, FpsTimeline, FrameDurationChart},
};
use crate::config::{Config, TraceConfig};
use crate::error::{AnalysisError, Result};
use crate::output::{self, ArtifactLog, ArtifactOptions};
use crate::report;
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One entry of `traceEvents`; fields that are absent stay `None`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TraceEvent {
    pub name: Option<String>,
    pub cat: Option<String>,
    pub ph: Option<String>,
    /// Microseconds
    pub ts: Option<f64>,
    /// Microseconds
    pub dur: Option<f64>,
}

impl TraceEvent {
    fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    fn is_phase(&self, phase: &str) -> bool {
        self.ph.as_deref() == Some(phase)
    }

    /// Timestamp in ms, only when present and non-zero
    fn ts_ms(&self) -> Option<f64> {
        self.ts.filter(|&ts| ts != 0.0).map(|ts| ts / 1000.0)
    }
}

/// Accepted trace layouts: the DevTools object form or a bare event array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceFile {
    Object {
        #[serde(rename = "traceEvents", default)]
        trace_events: Vec<TraceEvent>,
    },
    Array(Vec<TraceEvent>),
}

/// Read and decode a trace file
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceEvent>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalysisError::InputNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| AnalysisError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(&content)
}

/// Decode trace JSON text
pub fn parse_trace(content: &str) -> Result<Vec<TraceEvent>> {
    let file: TraceFile =
        serde_json::from_str(content).map_err(|e| AnalysisError::MalformedTrace(e.to_string()))?;
    Ok(match file {
        TraceFile::Object { trace_events } => trace_events,
        TraceFile::Array(events) => events,
    })
}

/// Display refresh rate estimated from vsync events
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonitorInfo {
    pub refresh_rate_hz: u32,
    pub avg_vsync_interval_ms: f64,
}

/// Processing time of each frame, from User Timing measures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameDurationStats {
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    /// 1000 / average duration
    pub theoretical_max_fps: f64,
}

impl FrameDurationStats {
    pub fn from_durations(durations_ms: &[f64]) -> Option<Self> {
        let min_ms = stats::min(durations_ms)?;
        let max_ms = stats::max(durations_ms)?;
        let avg_ms = stats::mean(durations_ms);
        Some(Self {
            avg_ms,
            min_ms,
            max_ms,
            theoretical_max_fps: fps_of(avg_ms),
        })
    }
}

/// Frame rate summary over the capture
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FpsAnalysis {
    pub duration_s: f64,
    pub total_frames: usize,
    /// Frames divided by capture duration
    pub effective_fps: f64,
    /// 1000 / mean interval
    pub avg_fps: f64,
    pub min_fps: f64,
    pub max_fps: f64,
    pub avg_interval_ms: f64,
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
}

impl FpsAnalysis {
    /// Summarise sorted frame timestamps (ms); `None` with fewer than two
    pub fn from_timestamps(timestamps_ms: &[f64]) -> Option<Self> {
        if timestamps_ms.len() < 2 {
            return None;
        }
        let intervals = frame_intervals(timestamps_ms);
        let avg_interval_ms = stats::mean(&intervals);
        let min_interval_ms = stats::min(&intervals)?;
        let max_interval_ms = stats::max(&intervals)?;
        let duration_s = (timestamps_ms[timestamps_ms.len() - 1] - timestamps_ms[0]) / 1000.0;
        let total_frames = timestamps_ms.len();

        Some(Self {
            duration_s,
            total_frames,
            effective_fps: if duration_s > 0.0 {
                total_frames as f64 / duration_s
            } else {
                f64::INFINITY
            },
            avg_fps: fps_of(avg_interval_ms),
            min_fps: fps_of(max_interval_ms),
            max_fps: fps_of(min_interval_ms),
            avg_interval_ms,
            min_interval_ms,
            max_interval_ms,
        })
    }
}

/// Frame rate implied by an interval; a zero interval is an infinite rate
pub fn fps_of(interval_ms: f64) -> f64 {
    if interval_ms > 0.0 {
        1000.0 / interval_ms
    } else {
        f64::INFINITY
    }
}

/// Consecutive differences of sorted timestamps
pub fn frame_intervals(timestamps_ms: &[f64]) -> Vec<f64> {
    timestamps_ms.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Frame-rate ranges used for the distribution table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FpsBucket {
    Below10,
    From10To15,
    From15To20,
    From20To30,
    Above30,
}

impl FpsBucket {
    pub const ALL: [FpsBucket; 5] = [
        FpsBucket::Below10,
        FpsBucket::From10To15,
        FpsBucket::From15To20,
        FpsBucket::From20To30,
        FpsBucket::Above30,
    ];

    pub fn from_fps(fps: f64) -> Self {
        if fps < 10.0 {
            FpsBucket::Below10
        } else if fps < 15.0 {
            FpsBucket::From10To15
        } else if fps < 20.0 {
            FpsBucket::From15To20
        } else if fps < 30.0 {
            FpsBucket::From20To30
        } else {
            FpsBucket::Above30
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FpsBucket::Below10 => "<10",
            FpsBucket::From10To15 => "10-15",
            FpsBucket::From15To20 => "15-20",
            FpsBucket::From20To30 => "20-30",
            FpsBucket::Above30 => ">30",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Interval counts per [`FpsBucket`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FpsDistribution {
    counts: [usize; 5],
}

impl FpsDistribution {
    pub fn from_intervals(intervals_ms: &[f64]) -> Self {
        let mut distribution = Self::default();
        for &interval in intervals_ms {
            distribution.counts[FpsBucket::from_fps(fps_of(interval)).index()] += 1;
        }
        distribution
    }

    pub fn count(&self, bucket: FpsBucket) -> usize {
        self.counts[bucket.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Percentage of intervals in `buckets`, 0 when empty
    pub fn share_pct(&self, buckets: &[FpsBucket]) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let n: usize = buckets.iter().map(|b| self.count(*b)).sum();
        n as f64 / total as f64 * 100.0
    }

    /// Share of intervals above 30 FPS
    pub fn high_share_pct(&self) -> f64 {
        self.share_pct(&[FpsBucket::Above30])
    }

    /// Share of intervals below 15 FPS
    pub fn low_share_pct(&self) -> f64 {
        self.share_pct(&[FpsBucket::Below10, FpsBucket::From10To15])
    }
}

/// Where the frame timestamps were taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameSource {
    /// `frame-process` complete events (`ph == "X"`)
    UserTimingComplete,
    /// `frame-process` begin/end pairs
    UserTimingBeginEnd,
    /// Generic script execution events
    Fallback,
}

/// Result of a trace analysis
#[derive(Debug, Clone, Serialize)]
pub struct TraceAnalysis {
    pub trace_file: PathBuf,
    pub target_fps: f64,
    pub frame_source: FrameSource,
    pub monitor: Option<MonitorInfo>,
    pub frame_duration: Option<FrameDurationStats>,
    pub fps: FpsAnalysis,
    pub distribution: FpsDistribution,
    pub timestamps_ms: Vec<f64>,
    pub intervals_ms: Vec<f64>,
    pub durations_ms: Vec<f64>,
}

impl TraceAnalysis {
    /// Frame rate of every interval
    pub fn fps_values(&self) -> Vec<f64> {
        self.intervals_ms.iter().map(|&i| fps_of(i)).collect()
    }
}

/// Refresh rate from instant vsync events, when there are enough of them
pub fn monitor_info(events: &[TraceEvent], config: &TraceConfig) -> Option<MonitorInfo> {
    let mut vsync: Vec<f64> = events
        .iter()
        .filter(|e| {
            e.is_phase("I")
                && e.name
                    .as_deref()
                    .is_some_and(|n| config.vsync_event_names.iter().any(|v| v == n))
        })
        .filter_map(TraceEvent::ts_ms)
        .collect();

    if vsync.len() <= config.min_vsync_events {
        return None;
    }
    vsync.sort_by(|a, b| a.total_cmp(b));
    let avg_vsync_interval_ms = stats::mean(&frame_intervals(&vsync));
    if avg_vsync_interval_ms <= 0.0 {
        return None;
    }

    Some(MonitorInfo {
        refresh_rate_hz: (1000.0 / avg_vsync_interval_ms).round() as u32,
        avg_vsync_interval_ms,
    })
}

/// Frame events selected from the trace plus any measured durations (ms)
struct FrameSelection<'a> {
    source: FrameSource,
    events: Vec<&'a TraceEvent>,
    durations_ms: Vec<f64>,
}

fn select_frames<'a>(events: &'a [TraceEvent], config: &TraceConfig) -> FrameSelection<'a> {
    let markers: Vec<&TraceEvent> = events
        .iter()
        .filter(|e| {
            e.is_named(&config.frame_marker_name)
                && e.cat
                    .as_deref()
                    .is_some_and(|c| c.contains(config.user_timing_category.as_str()))
        })
        .collect();
    log::info!("'{}' events found: {}", config.frame_marker_name, markers.len());

    if markers.is_empty() {
        log::info!("No User Timing markers found, using generic script events");
        let fallback = events
            .iter()
            .filter(|e| {
                e.name
                    .as_deref()
                    .is_some_and(|n| config.fallback_event_names.iter().any(|f| f == n))
            })
            .collect();
        return FrameSelection {
            source: FrameSource::Fallback,
            events: fallback,
            durations_ms: Vec::new(),
        };
    }

    let complete: Vec<&TraceEvent> = markers
        .iter()
        .copied()
        .filter(|e| e.is_phase("X") && e.dur.is_some())
        .collect();
    if !complete.is_empty() {
        let durations_ms = complete.iter().filter_map(|e| e.dur).map(|d| d / 1000.0).collect();
        log::info!("Complete events (ph=X): {}", complete.len());
        return FrameSelection {
            source: FrameSource::UserTimingComplete,
            events: complete,
            durations_ms,
        };
    }

    let sorted_phase = |phase: &str| {
        let mut selected: Vec<&TraceEvent> = markers
            .iter()
            .copied()
            .filter(|e| e.is_phase(phase) && e.ts.is_some())
            .collect();
        selected.sort_by(|a, b| a.ts.unwrap_or(0.0).total_cmp(&b.ts.unwrap_or(0.0)));
        selected
    };
    let begins = sorted_phase("b");
    let ends = sorted_phase("e");
    log::info!("Begin/end events: {} begin, {} end", begins.len(), ends.len());

    let durations_ms = begins
        .iter()
        .zip(&ends)
        .map(|(b, e)| (e.ts.unwrap_or(0.0) - b.ts.unwrap_or(0.0)) / 1000.0)
        .collect();

    FrameSelection {
        source: FrameSource::UserTimingBeginEnd,
        events: begins,
        durations_ms,
    }
}

/// Sorted distinct event names, at most `limit`
pub fn distinct_event_names(events: &[TraceEvent], limit: usize) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.name.as_deref())
        .filter(|n| !n.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// FPS analysis pipeline for DevTools traces
pub struct TraceAnalyzer {
    config: Config,
}

impl TraceAnalyzer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn analyze_file<P: AsRef<Path>>(&self, trace_path: P) -> Result<TraceAnalysis> {
        let trace_path = trace_path.as_ref();
        let events = load_trace(trace_path)?;
        log::debug!("Loaded {} trace events", events.len());
        self.analyze_events(trace_path, &events)
    }

    pub fn analyze_events(&self, trace_file: &Path, events: &[TraceEvent]) -> Result<TraceAnalysis> {
        let trace = &self.config.trace;
        let monitor = monitor_info(events, trace);
        let selection = select_frames(events, trace);

        let mut timestamps_ms: Vec<f64> =
            selection.events.iter().filter_map(|e| e.ts_ms()).collect();
        timestamps_ms.sort_by(|a, b| a.total_cmp(b));

        let fps = match FpsAnalysis::from_timestamps(&timestamps_ms) {
            Some(fps) => fps,
            None => {
                let names = distinct_event_names(events, 20);
                log::warn!(
                    "Insufficient frame events: {} in trace, {} frame events",
                    events.len(),
                    selection.events.len()
                );
                for name in &names {
                    log::warn!("  - {}", name);
                }
                return Err(AnalysisError::InsufficientData(format!(
                    "{} frame timestamps among {} trace events; first event names: {}",
                    timestamps_ms.len(),
                    events.len(),
                    names.join(", ")
                )));
            }
        };

        let intervals_ms = frame_intervals(&timestamps_ms);
        let distribution = FpsDistribution::from_intervals(&intervals_ms);

        Ok(TraceAnalysis {
            trace_file: trace_file.to_path_buf(),
            target_fps: trace.target_fps,
            frame_source: selection.source,
            monitor,
            frame_duration: FrameDurationStats::from_durations(&selection.durations_ms),
            fps,
            distribution,
            timestamps_ms,
            intervals_ms,
            durations_ms: selection.durations_ms,
        })
    }

    /// Write the charts and Markdown report requested by `options`
    pub fn export(&self, analysis: &TraceAnalysis, options: &ArtifactOptions) -> ArtifactLog {
        let mut artifacts = ArtifactLog::default();
        if !options.wants_output() {
            return artifacts;
        }
        if let Err(e) = output::ensure_dir(&options.output_dir) {
            artifacts.record_failure("output directory", e);
            return artifacts;
        }

        let base = format!("trace_analysis_{}", output::file_timestamp("%Y-%m-%d-%H-%M-%S"));
        let size = self.config.output.chart_size;
        let size = (size[0], size[1]);
        let stem_for = |chart: &str| options.output_dir.join(format!("{}_{}", base, chart));

        if options.charts {
            let timeline = FpsTimeline::new(analysis);
            artifacts.merge(charts::save_chart(&timeline, &stem_for("fps_timeline"), options.format, size));
            let distribution = FpsDistributionChart::new(analysis);
            artifacts.merge(charts::save_chart(
                &distribution,
                &stem_for("fps_distribution"),
                options.format,
                size,
            ));
            let buckets = FpsBuckets::new(analysis);
            artifacts.merge(charts::save_chart(&buckets, &stem_for("fps_buckets"), options.format, size));
            if !analysis.durations_ms.is_empty() {
                let durations = FrameDurationChart::new(analysis);
                artifacts.merge(charts::save_chart(
                    &durations,
                    &stem_for("frame_duration"),
                    options.format,
                    size,
                ));
            }
        }

        if options.report {
            let content = report::trace::render(analysis, &self.config.trace);
            let path = options.output_dir.join(format!("{}.md", base));
            artifacts.record("trace report", output::write_text(&path, &content));
        }

        artifacts
    }
}

/// Console summary of a trace analysis
pub fn print_trace_summary(analysis: &TraceAnalysis) {
    println!("Analysing: {}\n", analysis.trace_file.display());

    if let Some(monitor) = analysis.monitor {
        println!("=== Monitor Info ===");
        println!("Configured target FPS: {} FPS", analysis.target_fps);
        println!(
            "Detected refresh rate: ~{} Hz ({:.2}ms per frame)",
            monitor.refresh_rate_hz, monitor.avg_vsync_interval_ms
        );
        println!();
    }

    if let Some(dur) = analysis.frame_duration {
        println!("=== Frame Duration Analysis ===");
        println!("Average duration: {:.2}ms", dur.avg_ms);
        println!("Minimum duration: {:.2}ms", dur.min_ms);
        println!("Maximum duration: {:.2}ms", dur.max_ms);
        println!(
            "Theoretical max FPS: ~{:.2} FPS (from average duration)",
            dur.theoretical_max_fps
        );
        println!();
    }

    let fps = &analysis.fps;
    println!("=== FPS Analysis ===");
    println!("Total duration: {:.2}s", fps.duration_s);
    println!("Total frames: {}", fps.total_frames);
    println!("\nAverage FPS (effective): {:.2}", fps.effective_fps);
    println!("Average FPS (intervals): {:.2}", fps.avg_fps);
    println!("Minimum FPS: {:.2}", fps.min_fps);
    println!("Maximum FPS: {:.2}", fps.max_fps);
    println!("\nAverage frame interval: {:.2}ms", fps.avg_interval_ms);
    println!("Minimum interval: {:.2}ms", fps.min_interval_ms);
    println!("Maximum interval: {:.2}ms", fps.max_interval_ms);

    let dist = &analysis.distribution;
    let total = dist.total();
    println!("\n=== FPS Distribution ===");
    for bucket in FpsBucket::ALL {
        let count = dist.count(bucket);
        let share = if total > 0 { count as f64 / total as f64 } else { 0.0 };
        let bar = "█".repeat((share * 50.0).round() as usize);
        println!(
            "{:<8} FPS: {} {:.1}% ({} frames)",
            bucket.label(),
            bar,
            share * 100.0,
            count
        );
    }
}
