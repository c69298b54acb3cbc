//! Validation tests for Chrome trace FPS analysis

use std::path::Path;
use theremin_lab::config::Config;
use theremin_lab::output::{ArtifactOptions, ImageFormat};
use theremin_lab::trace::{
    fps_of, load_trace, monitor_info, parse_trace, FpsBucket, FpsDistribution, FrameSource,
    TraceEvent,
};
use theremin_lab::{AnalysisError, TraceAnalyzer};

fn event(name: &str, cat: &str, ph: &str, ts_us: f64, dur_us: Option<f64>) -> TraceEvent {
    TraceEvent {
        name: Some(name.to_string()),
        cat: Some(cat.to_string()),
        ph: Some(ph.to_string()),
        ts: Some(ts_us),
        dur: dur_us,
    }
}

/// `frames` complete frame-process measures, 20ms apart, each lasting 8ms
fn generate_complete_frames(frames: usize) -> Vec<TraceEvent> {
    (0..frames)
        .map(|i| {
            event(
                "frame-process",
                "blink.user_timing",
                "X",
                1000.0 + i as f64 * 20_000.0,
                Some(8000.0),
            )
        })
        .collect()
}

/// Instant vsync events at a fixed interval (microseconds)
fn generate_vsync(count: usize, interval_us: f64) -> Vec<TraceEvent> {
    (0..count)
        .map(|i| event("BeginFrame", "disabled-by-default-devtools.timeline", "I", 500.0 + i as f64 * interval_us, None))
        .collect()
}

fn report_only(dir: &Path) -> ArtifactOptions {
    ArtifactOptions {
        output_dir: dir.to_path_buf(),
        format: ImageFormat::Png,
        charts: false,
        report: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_and_array_forms() {
        let object = r#"{"traceEvents": [{"name": "BeginFrame", "ph": "I", "ts": 1200}], "metadata": {}}"#;
        let events = parse_trace(object).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name.as_deref(), Some("BeginFrame"));
        assert_eq!(events[0].ts, Some(1200.0));
        assert_eq!(events[0].dur, None);

        let array = r#"[{"name": "FunctionCall", "ts": 10.5, "dur": 3}, {"ph": "M"}]"#;
        let events = parse_trace(array).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name, None);

        let no_events = parse_trace(r#"{"metadata": {"source": "DevTools"}}"#).unwrap();
        assert!(no_events.is_empty());
    }

    #[test]
    fn test_malformed_trace() {
        for bad in ["", "not json", "{\"traceEvents\": 12", "42"] {
            match parse_trace(bad) {
                Err(AnalysisError::MalformedTrace(_)) => {}
                other => panic!("Expected MalformedTrace for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_load_trace_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.json");
        assert!(matches!(load_trace(&path), Err(AnalysisError::InputNotFound(_))));

        std::fs::write(&path, r#"[{"name": "v8.run", "ts": 5000}]"#).unwrap();
        let events = load_trace(&path).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_complete_frame_events() {
        let analyzer = TraceAnalyzer::new(Config::default());
        let analysis = analyzer
            .analyze_events(Path::new("trace.json"), &generate_complete_frames(11))
            .unwrap();

        assert_eq!(analysis.frame_source, FrameSource::UserTimingComplete);
        assert_eq!(analysis.fps.total_frames, 11);
        assert!((analysis.fps.duration_s - 0.2).abs() < 1e-9);
        assert!((analysis.fps.effective_fps - 55.0).abs() < 1e-6);
        assert!((analysis.fps.avg_fps - 50.0).abs() < 1e-9);
        assert_eq!(analysis.intervals_ms.len(), 10);
        assert_eq!(analysis.distribution.count(FpsBucket::Above30), 10);

        let durations = analysis.frame_duration.expect("complete events carry durations");
        assert_eq!(durations.avg_ms, 8.0);
        assert_eq!(durations.theoretical_max_fps, 125.0);
        assert!(analysis.monitor.is_none());
    }

    #[test]
    fn test_begin_end_pairs() {
        let mut events = Vec::new();
        for i in [3.0, 0.0, 2.0, 1.0] {
            let ts = 10_000.0 + i * 40_000.0;
            events.push(event("frame-process", "blink.user_timing", "b", ts, None));
            events.push(event("frame-process", "blink.user_timing", "e", ts + 5000.0, None));
        }

        let analyzer = TraceAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_events(Path::new("pairs.json"), &events).unwrap();

        assert_eq!(analysis.frame_source, FrameSource::UserTimingBeginEnd);
        assert_eq!(analysis.timestamps_ms, vec![10.0, 50.0, 90.0, 130.0]);
        assert_eq!(analysis.durations_ms, vec![5.0; 4]);
        assert!((analysis.fps.avg_fps - 25.0).abs() < 1e-9);
        assert_eq!(analysis.distribution.count(FpsBucket::From20To30), 3);
    }

    #[test]
    fn test_fallback_events() {
        let mut events: Vec<TraceEvent> = (0..6)
            .map(|i| event("FunctionCall", "devtools.timeline", "X", 1000.0 + i as f64 * 100_000.0, Some(2000.0)))
            .collect();
        // Wrong category, so not a frame marker
        events.push(event("frame-process", "devtools.timeline", "X", 70_000.0, Some(1000.0)));

        let analyzer = TraceAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_events(Path::new("fallback.json"), &events).unwrap();

        assert_eq!(analysis.frame_source, FrameSource::Fallback);
        assert_eq!(analysis.fps.total_frames, 6);
        assert!(analysis.frame_duration.is_none());
        assert!(analysis.durations_ms.is_empty());
        assert_eq!(
            analysis.distribution.count(FpsBucket::From10To15),
            5,
            "10 FPS belongs to the 10-15 range"
        );
    }

    #[test]
    fn test_zero_timestamps_are_ignored() {
        let mut events = generate_complete_frames(3);
        events.push(event("frame-process", "blink.user_timing", "X", 0.0, Some(8000.0)));

        let analyzer = TraceAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_events(Path::new("trace.json"), &events).unwrap();

        assert_eq!(analysis.timestamps_ms.len(), 3);
        assert_eq!(analysis.durations_ms.len(), 4, "Durations are kept for every complete event");
    }

    #[test]
    fn test_insufficient_frames() {
        let mut events = generate_complete_frames(1);
        events.push(event("Layout", "devtools.timeline", "X", 2000.0, Some(10.0)));

        let analyzer = TraceAnalyzer::new(Config::default());
        match analyzer.analyze_events(Path::new("short.json"), &events) {
            Err(AnalysisError::InsufficientData(msg)) => {
                println!("{}", msg);
                assert!(msg.contains("Layout") && msg.contains("frame-process"));
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }

        let empty = analyzer.analyze_events(Path::new("empty.json"), &[]);
        assert!(matches!(empty, Err(AnalysisError::InsufficientData(_))));
    }

    #[test]
    fn test_monitor_detection() {
        let config = Config::default();
        let mut events = generate_vsync(11, 16_667.0);
        let monitor = monitor_info(&events, &config.trace).expect("11 vsync events are enough");
        assert_eq!(monitor.refresh_rate_hz, 60);
        assert!((monitor.avg_vsync_interval_ms - 16.667).abs() < 1e-9);

        events.truncate(10);
        assert!(monitor_info(&events, &config.trace).is_none(), "Needs more than 10 vsync events");

        let non_instant: Vec<TraceEvent> = generate_vsync(20, 8333.0)
            .into_iter()
            .map(|mut e| {
                e.ph = Some("X".to_string());
                e
            })
            .collect();
        assert!(monitor_info(&non_instant, &config.trace).is_none());
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(FpsBucket::from_fps(9.99), FpsBucket::Below10);
        assert_eq!(FpsBucket::from_fps(10.0), FpsBucket::From10To15);
        assert_eq!(FpsBucket::from_fps(15.0), FpsBucket::From15To20);
        assert_eq!(FpsBucket::from_fps(20.0), FpsBucket::From20To30);
        assert_eq!(FpsBucket::from_fps(30.0), FpsBucket::Above30);
        assert_eq!(FpsBucket::from_fps(f64::INFINITY), FpsBucket::Above30);
    }

    #[test]
    fn test_zero_interval_counts_as_high_fps() {
        assert_eq!(fps_of(0.0), f64::INFINITY);

        let dist = FpsDistribution::from_intervals(&[0.0, 50.0, 200.0, 10.0]);
        assert_eq!(dist.total(), 4);
        assert_eq!(dist.count(FpsBucket::Above30), 2);
        assert_eq!(dist.count(FpsBucket::From20To30), 1);
        assert_eq!(dist.count(FpsBucket::Below10), 1);
        assert_eq!(dist.high_share_pct(), 50.0);
        assert_eq!(dist.low_share_pct(), 25.0);

        assert_eq!(FpsDistribution::default().share_pct(&FpsBucket::ALL), 0.0);
    }

    #[test]
    fn test_report_for_smooth_trace() {
        let dir = tempfile::tempdir().unwrap();
        let mut events = generate_complete_frames(11);
        events.extend(generate_vsync(12, 16_667.0));

        let analyzer = TraceAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_events(Path::new("smooth.json"), &events).unwrap();
        let artifacts = analyzer.export(&analysis, &report_only(dir.path()));

        assert!(artifacts.is_success());
        assert_eq!(artifacts.written.len(), 1);
        let name = artifacts.written[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("trace_analysis_") && name.ends_with(".md"), "{}", name);

        let report = std::fs::read_to_string(&artifacts.written[0]).unwrap();
        println!("{}", report);
        assert!(report.contains("**Configured target FPS:** 30 FPS"));
        assert!(report.contains("~60 Hz"));
        assert!(report.contains("**Excellent**: average FPS (55.00)"));
        assert!(report.contains("Excellent distribution with 100.0% of frames above 30 FPS"));
        assert!(report.contains("**frame_duration**"));
        assert!(report.contains("The application performs excellently"));
        assert!(!report.contains("**Warning**"));
    }

    #[test]
    fn test_report_for_slow_trace() {
        let mut config = Config::default();
        config.trace.target_fps = 60.0;
        let events: Vec<TraceEvent> = (0..5)
            .map(|i| event("EvaluateScript", "devtools.timeline", "X", 1000.0 + i as f64 * 150_000.0, None))
            .collect();

        let analyzer = TraceAnalyzer::new(config.clone());
        let analysis = analyzer.analyze_events(Path::new("slow.json"), &events).unwrap();
        let report = theremin_lab::report::trace::render(&analysis, &config.trace);

        assert!(report.contains("**Below expectations**"));
        assert!(report.contains("**High priority**"));
        assert!(report.contains("**Frame drops detected**: maximum interval of 150.00 ms"));
        assert!(report.contains("**Warning**: 100.0% of frames below 15 FPS"));
        assert!(!report.contains("**frame_duration**"));
        assert!(report.contains("performs below expectations"));
    }

    #[test]
    fn test_export_renders_charts() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = TraceAnalyzer::new(Config::default());
        let analysis = analyzer
            .analyze_events(Path::new("trace.json"), &generate_complete_frames(11))
            .unwrap();

        let options = ArtifactOptions {
            format: ImageFormat::Svg,
            charts: true,
            ..report_only(dir.path())
        };
        let artifacts = analyzer.export(&analysis, &options);
        assert!(artifacts.is_success(), "Failures: {:?}", artifacts.failed);

        let names: Vec<String> = artifacts
            .written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        println!("Written: {:?}", names);
        assert_eq!(names.len(), 5);
        let base = names[4].trim_end_matches(".md");
        assert!(base.starts_with("trace_analysis_"));
        for (name, chart) in names.iter().zip(["fps_timeline", "fps_distribution", "fps_buckets", "frame_duration"]) {
            assert_eq!(name, &format!("{}_{}.svg", base, chart));
        }
    }

    #[test]
    fn test_export_without_durations_skips_duration_chart() {
        let dir = tempfile::tempdir().unwrap();
        // Duplicate timestamp gives a zero interval
        let events: Vec<TraceEvent> = [1000.0, 1000.0, 34_000.0, 67_000.0]
            .iter()
            .map(|&ts| event("FunctionCall", "devtools.timeline", "X", ts, None))
            .collect();

        let analyzer = TraceAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_events(Path::new("fallback.json"), &events).unwrap();
        assert!(analysis.fps_values()[0].is_infinite());

        let options = ArtifactOptions {
            format: ImageFormat::Svg,
            charts: true,
            ..report_only(dir.path())
        };
        let artifacts = analyzer.export(&analysis, &options);
        assert!(artifacts.is_success(), "Failures: {:?}", artifacts.failed);
        assert_eq!(artifacts.written.len(), 4, "Three charts and the report");
        assert!(artifacts
            .written
            .iter()
            .all(|p| !p.to_string_lossy().contains("frame_duration")));
    }
}
