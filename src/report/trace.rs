//! Trace performance report

use super::{ms, Markdown};
use crate::config::TraceConfig;
use crate::output::{display_name, report_timestamp};
use crate::trace::{FpsBucket, TraceAnalysis};

/// Effective FPS relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpsGrade {
    Excellent,
    Good,
    Adequate,
    BelowTarget,
}

impl FpsGrade {
    pub fn from_fps(effective_fps: f64, target_fps: f64) -> Self {
        if effective_fps >= target_fps * 1.5 {
            FpsGrade::Excellent
        } else if effective_fps >= target_fps {
            FpsGrade::Good
        } else if effective_fps >= target_fps * 0.8 {
            FpsGrade::Adequate
        } else {
            FpsGrade::BelowTarget
        }
    }
}

fn assessment(fps: f64, target: f64) -> String {
    match FpsGrade::from_fps(fps, target) {
        FpsGrade::Excellent => format!(
            "**Excellent**: average FPS ({:.2}) is well above the target ({})",
            fps, target
        ),
        FpsGrade::Good => format!("**Good**: average FPS ({:.2}) meets or exceeds the target ({})", fps, target),
        FpsGrade::Adequate => format!(
            "**Adequate**: average FPS ({:.2}) is close to the target ({}), with room for optimisation",
            fps, target
        ),
        FpsGrade::BelowTarget => format!(
            "**Below expectations**: average FPS ({:.2}) is well below the target ({})",
            fps, target
        ),
    }
}

fn distribution_assessment(high_pct: f64) -> String {
    if high_pct >= 95.0 {
        format!("Excellent distribution with {:.1}% of frames above 30 FPS", high_pct)
    } else if high_pct >= 80.0 {
        format!("Good distribution with {:.1}% of frames above 30 FPS", high_pct)
    } else if high_pct >= 60.0 {
        format!("Moderate distribution with {:.1}% of frames above 30 FPS", high_pct)
    } else {
        format!("Irregular distribution: only {:.1}% of frames above 30 FPS", high_pct)
    }
}

/// Optimisation recommendations derived from the analysis
pub fn recommendations(analysis: &TraceAnalysis, frame_drop_interval_ms: f64) -> Vec<String> {
    let fps = &analysis.fps;
    let high_pct = analysis.distribution.high_share_pct();
    let mut items = Vec::new();

    if fps.effective_fps < analysis.target_fps {
        items.push("**High priority**: average FPS below target, investigate processing bottlenecks".to_string());
    }
    if fps.max_interval_ms > frame_drop_interval_ms {
        items.push(format!(
            "**Frame drops detected**: maximum interval of {} indicates occasional stalls",
            ms(fps.max_interval_ms)
        ));
    }
    if let Some(dur) = analysis.frame_duration {
        if dur.max_ms > dur.avg_ms * 2.0 {
            items.push(format!(
                "**High variability**: duration spikes up to {}, consider optimising asynchronous code",
                ms(dur.max_ms)
            ));
        }
    }
    if high_pct < 90.0 {
        items.push(format!(
            "Improve frame-rate consistency: currently {:.1}% above 30 FPS",
            high_pct
        ));
    }
    items
}

/// Render the trace report
pub fn render(analysis: &TraceAnalysis, config: &TraceConfig) -> String {
    let timestamp = report_timestamp();
    let target = analysis.target_fps;
    let fps = &analysis.fps;
    let dist = &analysis.distribution;
    let mut md = Markdown::new();

    md.heading(1, "Performance Analysis Report - Chrome Trace");
    md.line(&format!("**Analysis date:** {}  ", timestamp));
    md.line(&format!("**Trace file:** `{}`", display_name(&analysis.trace_file)));
    md.blank();

    md.heading(2, "Executive Summary");
    md.paragraph(
        "This report analyses frame performance captured with a Chrome DevTools performance trace, focusing on FPS (frames per second) and processing time.",
    );

    md.heading(2, "System Configuration");
    md.paragraph(&format!("**Configured target FPS:** {} FPS", target));
    if let Some(monitor) = analysis.monitor {
        md.heading(3, "Monitor Information");
        md.table(
            &["Metric", "Value"],
            &[
                vec!["**Refresh rate**".to_string(), format!("~{} Hz", monitor.refresh_rate_hz)],
                vec!["**Mean vsync interval**".to_string(), ms(monitor.avg_vsync_interval_ms)],
            ],
        );
    }

    if let Some(dur) = analysis.frame_duration {
        md.heading(2, "Processing Duration Analysis");
        md.heading(3, "Frame duration metrics");
        md.table(
            &["Metric", "Value"],
            &[
                vec!["**Mean duration**".to_string(), ms(dur.avg_ms)],
                vec!["**Minimum duration**".to_string(), ms(dur.min_ms)],
                vec!["**Maximum duration**".to_string(), ms(dur.max_ms)],
                vec![
                    "**Theoretical max FPS**".to_string(),
                    format!("~{:.2} FPS", dur.theoretical_max_fps),
                ],
            ],
        );
        let spread = dur.max_ms - dur.min_ms;
        let consistency = if spread < 20.0 {
            "high consistency"
        } else if spread < 50.0 {
            "moderate variability"
        } else {
            "high variability"
        };
        let budget = if dur.avg_ms < 16.67 {
            "Optimised performance"
        } else if dur.avg_ms < 33.33 {
            "Performance adequate for 30 FPS"
        } else {
            "Possible performance bottleneck detected"
        };
        md.line("**Interpretation:**");
        md.bullet(&format!(
            "A mean duration of {} per frame theoretically allows up to {:.2} FPS",
            ms(dur.avg_ms),
            dur.theoretical_max_fps
        ));
        md.bullet(&format!(
            "Duration range {} to {} indicates {}",
            ms(dur.min_ms),
            ms(dur.max_ms),
            consistency
        ));
        md.bullet(budget);
        md.blank();
    }

    md.heading(2, "FPS Analysis (Frames Per Second)");
    md.heading(3, "General metrics");
    md.table(
        &["Metric", "Value"],
        &[
            vec!["**Capture duration**".to_string(), format!("{:.2} seconds", fps.duration_s)],
            vec!["**Frames processed**".to_string(), fps.total_frames.to_string()],
            vec!["**Average FPS (effective)**".to_string(), format!("{:.2}", fps.effective_fps)],
            vec!["**Average FPS (intervals)**".to_string(), format!("{:.2}", fps.avg_fps)],
            vec!["**Minimum FPS**".to_string(), format!("{:.2}", fps.min_fps)],
            vec!["**Maximum FPS**".to_string(), format!("{:.2}", fps.max_fps)],
        ],
    );
    md.heading(3, "Frame intervals");
    md.table(
        &["Metric", "Value"],
        &[
            vec!["**Mean interval**".to_string(), ms(fps.avg_interval_ms)],
            vec!["**Minimum interval**".to_string(), ms(fps.min_interval_ms)],
            vec!["**Maximum interval**".to_string(), ms(fps.max_interval_ms)],
        ],
    );
    md.heading(3, "Performance assessment");
    md.paragraph(&assessment(fps.effective_fps, target));

    md.heading(2, "FPS Distribution");
    md.heading(3, "By range");
    let rows: Vec<Vec<String>> = FpsBucket::ALL
        .iter()
        .map(|&bucket| {
            vec![
                format!("**{} FPS**", bucket.label()),
                dist.count(bucket).to_string(),
                format!("{:.1}%", dist.share_pct(&[bucket])),
            ]
        })
        .collect();
    md.table(&["FPS range", "Frames", "Share"], &rows);

    let high_pct = dist.high_share_pct();
    let low_pct = dist.low_share_pct();
    md.heading(3, "Distribution analysis");
    md.bullet(&distribution_assessment(high_pct));
    if low_pct > 5.0 {
        md.bullet(&format!(
            "**Warning**: {:.1}% of frames below 15 FPS may be perceived as stutter",
            low_pct
        ));
    }
    md.blank();

    md.heading(2, "Recommendations");
    md.heading(3, "Performance optimisation");
    for item in recommendations(analysis, config.frame_drop_interval_ms) {
        md.bullet(&item);
    }
    md.blank();
    md.heading(3, "Next steps");
    md.line("1. Review the frame processing code to find bottlenecks");
    md.line("2. Analyse additional traces under different load conditions");
    md.line("3. Add throttling or frame skipping if needed");
    md.line("4. Monitor the metrics after optimisations");
    md.blank();

    md.heading(2, "Generated Charts");
    md.bullet("**fps_timeline**: FPS over the capture with the target FPS line");
    md.bullet("**fps_distribution**: FPS histogram");
    md.bullet("**fps_buckets**: frames per FPS range");
    if !analysis.durations_ms.is_empty() {
        md.bullet("**frame_duration**: processing duration per frame");
    }
    md.blank();

    md.heading(2, "Conclusion");
    let conclusion = if fps.effective_fps >= target && high_pct >= 90.0 {
        format!(
            "The application performs excellently, consistently above the {} FPS target. The system is well optimised for the current load.",
            target
        )
    } else if fps.effective_fps >= target * 0.9 {
        format!(
            "The application performs adequately, with average FPS close to the {} FPS target. There is room to improve consistency.",
            target
        )
    } else {
        format!(
            "The application performs below expectations, averaging {:.2} FPS against a {} FPS target. Investigation and optimisation are a priority.",
            fps.effective_fps, target
        )
    };
    md.paragraph(&conclusion);
    md.footer("trace", &timestamp);
    md.finish()
}
