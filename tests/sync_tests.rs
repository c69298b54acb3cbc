//! Validation tests for the synchronisation analysis and its report

use std::path::{Path, PathBuf};
use theremin_lab::charts::sync::SyncDashboard;
use theremin_lab::config::Config;
use theremin_lab::midi::{MessageKind, TimedMessage};
use theremin_lab::onsets::{OnsetSets, Role};
use theremin_lab::output::{ArtifactOptions, ImageFormat};
use theremin_lab::report;
use theremin_lab::sync::{RoleAnalysis, SyncAnalysis, SyncAnalyzer, SyncComparison, Winner};
use theremin_lab::PrecisionMetrics;

fn note_on(delta_sec: f64, note: u8) -> TimedMessage {
    TimedMessage::new(
        delta_sec,
        MessageKind::NoteOn {
            channel: 0,
            note,
            velocity: 100,
        },
    )
}

/// Clicks every 500ms from 1s; gesture and keyboard offsets (ms) cycle through the given patterns
fn generate_session(beats: usize, gesture_ms: &[f64], keyboard_ms: &[f64]) -> Vec<TimedMessage> {
    let mut events: Vec<(f64, u8)> = Vec::new();
    for i in 0..beats {
        let click = 1.0 + i as f64 * 0.5;
        events.push((click, 24));
        if !gesture_ms.is_empty() {
            events.push((click + gesture_ms[i % gesture_ms.len()] / 1000.0, 60));
        }
        if !keyboard_ms.is_empty() {
            events.push((click + keyboard_ms[i % keyboard_ms.len()] / 1000.0, 48));
        }
    }
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut previous = 0.0;
    events
        .into_iter()
        .map(|(t, note)| {
            let message = note_on(t - previous, note);
            previous = t;
            message
        })
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

fn with_charts(dir: &Path, format: ImageFormat) -> ArtifactOptions {
    ArtifactOptions {
        format,
        charts: true,
        ..report_only(dir)
    }
}

fn written_names(written: &[PathBuf]) -> Vec<String> {
    written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_of_steady_session() {
        let messages = generate_session(16, &[20.0, 30.0, 10.0], &[-5.0, 5.0]);
        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(Path::new("session.mid"), &messages);

        assert_eq!(analysis.onsets.reference.len(), 16);
        assert_eq!(analysis.gesture.metrics.count, 16);
        assert_eq!(analysis.control.metrics.count, 16);
        assert!(
            (analysis.gesture.metrics.offset_ms - 20.0).abs() < 1.5,
            "Gesture offset should be about 20ms, got {:.3}",
            analysis.gesture.metrics.offset_ms
        );
        assert!(analysis.control.metrics.offset_ms.abs() < 1.0);

        let comparison = analysis.comparison.expect("both roles have data");
        assert_eq!(comparison.better_precision, Winner::Control);
        assert_eq!(comparison.smaller_offset, Winner::Control);
    }

    #[test]
    fn test_missing_role_has_no_comparison() {
        let messages = generate_session(8, &[15.0], &[]);
        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(Path::new("gesture_only.mid"), &messages);

        assert!(analysis.gesture.has_data());
        assert!(!analysis.control.has_data());
        assert_eq!(analysis.control.metrics, PrecisionMetrics::default());
        assert!(analysis.control.extremes.is_none());
        assert!(analysis.comparison.is_none());
    }

    #[test]
    fn test_session_without_clicks() {
        let messages = vec![note_on(0.0, 60), note_on(0.5, 48)];
        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(Path::new("no_clicks.mid"), &messages);

        assert!(!analysis.gesture.has_data(), "No reference means no deviations");
        assert!(!analysis.control.has_data());
    }

    #[test]
    fn test_comparison_figures() {
        let gesture = PrecisionMetrics {
            offset_ms: -30.0,
            real_precision_ms: 10.0,
            corrected_precision_ms: 10.0,
            mean_absolute_deviation_ms: 30.0,
            count: 12,
        };
        let control = PrecisionMetrics {
            offset_ms: 5.0,
            real_precision_ms: 40.0,
            corrected_precision_ms: 40.0,
            mean_absolute_deviation_ms: 20.0,
            count: 12,
        };

        let cmp = SyncComparison::new(&gesture, &control);
        assert_eq!(cmp.precision_difference_ms, 30.0);
        assert_eq!(cmp.relative_efficiency_pct, 25.0);
        assert_eq!(cmp.gesture_abs_offset_ms, 30.0);
        assert_eq!(cmp.offset_difference_ms, 25.0);
        assert_eq!(cmp.better_precision, Winner::Gesture);
        assert_eq!(cmp.smaller_offset, Winner::Control);
        assert_eq!(cmp.improvement_pct(), 75.0);
    }

    #[test]
    fn test_zero_precision_efficiency() {
        let flat = PrecisionMetrics {
            count: 3,
            ..PrecisionMetrics::default()
        };
        let cmp = SyncComparison::new(&flat, &flat);
        assert_eq!(cmp.relative_efficiency_pct, 100.0);
        assert_eq!(cmp.improvement_pct(), 0.0);
    }

    #[test]
    fn test_report_content() {
        let config = Config::default();
        let messages = generate_session(6, &[80.0, 20.0], &[10.0]);
        let analyzer = SyncAnalyzer::new(config.clone());
        let analysis = analyzer.analyze_messages(Path::new("captures/take1.mid"), &messages);

        let report = report::sync::render(&analysis, &config);
        println!("{}", report);

        assert!(report.starts_with("# Gesture-Music Synchronisation Analysis Report"));
        assert!(report.contains("`take1.mid`"));
        assert!(report.contains("metronome (MIDI note 24)"));
        assert!(report.contains("| **Events analysed** | 6 |"));
        assert!(report.contains("## Comparative Analysis"));
        assert!(report.contains("**Optimise latency:** mean delay of 50.00 ms"));
        assert!(report.contains("**Increase the sample:**"), "Six gesture events is a small sample");
        assert!(report.contains("Although the traditional control was more precise"));
    }

    #[test]
    fn test_report_without_events() {
        let config = Config::default();
        let analyzer = SyncAnalyzer::new(config.clone());
        let analysis = analyzer.analyze_messages(Path::new("empty.mid"), &[]);

        let report = report::sync::render(&analysis, &config);
        assert!(report.contains("No gesture events detected"));
        assert!(report.contains("No keyboard events detected"));
        assert!(!report.contains("## Comparative Analysis"));
        assert!(report.contains("Limited analysis"));
    }

    #[test]
    fn test_export_writes_report_only() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(
            Path::new("session.mid"),
            &generate_session(12, &[12.0, 18.0], &[3.0]),
        );

        let artifacts = analyzer.export(&analysis, &report_only(dir.path()));
        assert!(artifacts.is_success());
        assert_eq!(artifacts.written.len(), 1);

        let written = &artifacts.written[0];
        let name = written.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("sync_analysis_") && name.ends_with(".md"), "{}", name);
        assert!(std::fs::read_to_string(written).unwrap().contains("## Conclusion"));
    }

    #[test]
    fn test_export_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file in the way").unwrap();

        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(Path::new("session.mid"), &generate_session(4, &[10.0], &[]));
        let artifacts = analyzer.export(&analysis, &report_only(&blocker.join("nested")));

        assert!(!artifacts.is_success());
        assert!(artifacts.written.is_empty());
    }

    #[test]
    fn test_nothing_requested_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("unused");
        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(Path::new("session.mid"), &generate_session(4, &[10.0], &[]));

        let options = ArtifactOptions {
            charts: false,
            report: false,
            ..report_only(&out)
        };
        let artifacts = analyzer.export(&analysis, &options);
        assert!(artifacts.is_success() && artifacts.written.is_empty());
        assert!(!out.exists(), "No output directory without requested artifacts");
    }

    #[test]
    fn test_export_renders_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(
            Path::new("session.mid"),
            &generate_session(12, &[25.0, 5.0, -10.0], &[8.0, -2.0]),
        );

        let artifacts = analyzer.export(&analysis, &with_charts(dir.path(), ImageFormat::Svg));
        assert!(artifacts.is_success(), "Failures: {:?}", artifacts.failed);

        let names = written_names(&artifacts.written);
        println!("Written: {:?}", names);
        assert_eq!(names.len(), 2);
        assert!(names[0].starts_with("sync_analysis_") && names[0].ends_with(".svg"));
        assert_eq!(names[1], names[0].replace(".svg", ".md"), "Chart and report share a stem");

        let svg = std::fs::read_to_string(&artifacts.written[0]).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_export_renders_empty_capture() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = SyncAnalyzer::new(Config::default());
        let analysis = analyzer.analyze_messages(Path::new("empty.mid"), &[]);

        let artifacts = analyzer.export(&analysis, &with_charts(dir.path(), ImageFormat::Both));
        assert!(artifacts.is_success(), "Failures: {:?}", artifacts.failed);

        let names = written_names(&artifacts.written);
        assert_eq!(names.len(), 3);
        assert!(names[0].ends_with(".png"));
        assert!(names[1].ends_with(".svg"));
        assert!(names[2].ends_with(".md"));
    }

    #[test]
    fn test_dashboard_offset_tie_credits_gesture() {
        let reference = [0.5, 1.0];
        let gesture = RoleAnalysis::new(Role::Gesture, &[0.5, 1.0], &reference);
        let control = RoleAnalysis::new(Role::Control, &[0.5, 1.0], &reference);
        let comparison = SyncComparison::new(&gesture.metrics, &control.metrics);
        assert_eq!(comparison.smaller_offset, Winner::Control);

        let analysis = SyncAnalysis {
            source_file: PathBuf::from("tie.mid"),
            onsets: OnsetSets {
                reference: reference.to_vec(),
                gesture: reference.to_vec(),
                control: reference.to_vec(),
            },
            gesture,
            control,
            comparison: Some(comparison),
        };
        let config = Config::default();
        let lines = SyncDashboard::new(&analysis, &config).summary_lines();
        println!("{}", lines.join("\n"));

        assert!(lines.iter().any(|l| l == "  - Smaller offset: Theremin"));
        assert!(lines.iter().any(|l| l == "  - More precise instrument: Keyboard"));
    }
}
