//! Gesture detection report

use super::{pct, Markdown};
use crate::config::GestureConfig;
use crate::gestures::{DetectionDetail, GestureAnalysis, SectionAnalysis};
use crate::output::{display_name, report_timestamp};
use crate::stats;

/// Qualitative assessment of a detection rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionGrade {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl DetectionGrade {
    pub fn from_rate(rate: f64, config: &GestureConfig) -> Self {
        let [excellent, good, moderate] = config.assessment_thresholds;
        if rate >= excellent {
            DetectionGrade::Excellent
        } else if rate >= good {
            DetectionGrade::Good
        } else if rate >= moderate {
            DetectionGrade::Moderate
        } else {
            DetectionGrade::Low
        }
    }

    pub fn section_label(&self) -> &'static str {
        match self {
            DetectionGrade::Excellent => "Excellent - consistent and reliable detection",
            DetectionGrade::Good => "Good - adequate detection with room for optimisation",
            DetectionGrade::Moderate => "Moderate - calibration adjustments required",
            DetectionGrade::Low => "Low - sensitivity needs review",
        }
    }

    fn interpretation(&self) -> &'static str {
        match self {
            DetectionGrade::Excellent => "The system showed **excellent detection capability**, capturing the planned gestures with high consistency. The gestural interface is well calibrated and responsive.",
            DetectionGrade::Good => "The system showed **good detection performance**, with satisfactory results but room to optimise the sensitivity of some gesture types.",
            DetectionGrade::Moderate => "The system showed **moderate performance** and needs calibration adjustments to detect gestures more consistently.",
            DetectionGrade::Low => "The system showed **low detection performance**, requiring a significant review of the sensitivity and calibration parameters.",
        }
    }
}

/// "note_on" -> "Note On"
fn title_case(event_type: &str) -> String {
    event_type
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_sections(md: &mut Markdown, analysis: &GestureAnalysis, config: &GestureConfig) {
    for section in &analysis.sections {
        match section {
            SectionAnalysis::Single(single) => {
                let d = &single.detection;
                md.heading(3, &format!("Section {}: {}", single.section_index, d.gesture_name));
                md.line("**Configuration:**");
                md.bullet(&format!("**Event type:** {}", title_case(&d.event_type)));
                md.bullet(&format!(
                    "**Period:** beats {} ({:.2}s - {:.2}s)",
                    single.beats.label(),
                    single.window.start_s,
                    single.window.end_s
                ));
                md.bullet(&format!("**Expected attempts:** {}", d.expected_attempts));
                md.blank();

                md.line("**Detection results:**");
                md.bullet(&format!("**Detected events:** {}", d.detected_events));
                md.bullet(&format!("**Detection rate:** {}", pct(d.detection_rate)));
                md.bullet(&format!("**Total events in section:** {}", single.total_events));
                md.blank();

                match &d.detail {
                    DetectionDetail::Notes(Some(notes)) => {
                        md.line("**MIDI note analysis:**");
                        md.bullet(&format!("**Detected notes:** {:?}", notes.notes));
                        md.bullet(&format!("**Note range:** {} - {}", notes.min_note, notes.max_note));
                        md.blank();
                    }
                    DetectionDetail::Control {
                        control,
                        stats: Some(cc),
                    } => {
                        md.line(&format!("**Control change analysis (CC{}):**", control));
                        md.bullet(&format!(
                            "**Value range:** {} - {} (of 0-127)",
                            cc.min_value, cc.max_value
                        ));
                        md.bullet(&format!("**Mean value:** {:.1}", cc.mean_value));
                        md.bullet(&format!("**Standard deviation:** {:.1}", cc.std_value));
                        md.bullet(&format!("**MIDI range coverage:** {:.1}%", cc.coverage_pct));
                        md.blank();
                    }
                    _ => {}
                }

                md.paragraph(&format!(
                    "**Assessment:** {}",
                    DetectionGrade::from_rate(d.detection_rate, config).section_label()
                ));
            }
            SectionAnalysis::Simultaneous(sim) => {
                md.heading(3, &format!("Simultaneous {}: {}", sim.beats.label(), sim.name));
                md.line("**Configuration:**");
                md.bullet(&format!(
                    "**Period:** beats {} ({:.2}s - {:.2}s)",
                    sim.beats.label(),
                    sim.window.start_s,
                    sim.window.end_s
                ));
                md.bullet(&format!("**Total events in section:** {}", sim.total_events));
                md.blank();
                md.paragraph("**Detection per gesture:**");
                for d in &sim.subsections {
                    let cc = d
                        .control_number()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "N/A".to_string());
                    md.bullet(&format!("**{}** (CC{}):", d.gesture_name, cc));
                    md.line(&format!("  - Detected events: {}", d.detected_events));
                    md.line(&format!("  - Detection rate: {}", pct(d.detection_rate)));
                    md.line(&format!("  - Expected attempts: {}", d.expected_attempts));
                    md.blank();
                }
            }
        }
    }
}

/// Calibration recommendations for weak sections
pub fn recommendations(analysis: &GestureAnalysis) -> Vec<String> {
    let singles: Vec<_> = analysis
        .sections
        .iter()
        .filter_map(|s| match s {
            SectionAnalysis::Single(single) => Some(&single.detection),
            SectionAnalysis::Simultaneous(_) => None,
        })
        .collect();

    let mut items = Vec::new();
    let note_rates: Vec<f64> = singles
        .iter()
        .filter(|d| d.event_type == "note_on")
        .map(|d| d.detection_rate)
        .collect();
    if !note_rates.is_empty() && stats::mean(&note_rates) < 0.5 {
        items.push(
            "**Pinch gestures:** increase detection sensitivity to capture more Note On events"
                .to_string(),
        );
    }
    for d in singles.iter().filter(|d| d.event_type == "control_change") {
        if d.detection_rate < 0.6 {
            items.push(format!(
                "**{}:** adjust control change parameters for better responsiveness",
                d.gesture_name
            ));
        }
    }
    items
}

/// Render the gesture detection report
pub fn render(analysis: &GestureAnalysis, config: &GestureConfig) -> String {
    let timestamp = report_timestamp();
    let summary = &analysis.summary;
    let mut md = Markdown::new();

    md.heading(1, "Gesture Detection Report - Web Theremin");
    md.line(&format!("**Analysis date:** {}  ", timestamp));
    md.line(&format!("**MIDI file:** `{}`  ", display_name(&analysis.events_file)));
    md.line(&format!("**Gesture plan:** `{}`", display_name(&analysis.plan_file)));
    md.blank();

    md.heading(2, "Executive Summary");
    md.paragraph(
        "This report analyses the gesture detection of the Web Theremin, focusing on the number and quality of MIDI events detected during structured gestural interaction tests.",
    );

    md.heading(2, "Detection Methodology");
    md.bullet(&format!("**Test BPM:** {}", analysis.bpm));
    md.bullet(&format!("**Total duration:** {:.2} seconds", analysis.total_duration_s));
    md.bullet(&format!("**Total MIDI events:** {}", analysis.total_events));
    md.bullet(&format!("**Sections analysed:** {}", summary.sections_analyzed));
    md.bullet(&format!("**Planned attempts:** {}", summary.total_planned_attempts));
    md.blank();

    md.heading(2, "Results per Section");
    render_sections(&mut md, analysis, config);

    md.heading(2, "Overall Performance");
    md.heading(3, "Detection statistics");
    md.table(
        &["Metric", "Value"],
        &[
            vec!["**Average detection rate**".to_string(), pct(summary.average_detection_rate)],
            vec!["**Best performance**".to_string(), pct(summary.best_detection_rate)],
            vec!["**Worst performance**".to_string(), pct(summary.worst_detection_rate)],
            vec!["**Total planned attempts**".to_string(), summary.total_planned_attempts.to_string()],
            vec!["**MIDI events processed**".to_string(), analysis.total_events.to_string()],
        ],
    );
    md.heading(3, "Interpretation");
    md.paragraph(DetectionGrade::from_rate(summary.average_detection_rate, config).interpretation());

    md.heading(2, "Calibration Recommendations");
    md.heading(3, "Improving detection");
    for item in recommendations(analysis) {
        md.bullet(&item);
    }
    md.blank();
    md.heading(3, "Future analyses");
    md.bullet("Test different sensitivity settings");
    md.bullet("Analyse performance with multiple users");
    md.bullet("Document optimal settings for reproducibility");
    md.bullet("Implement automatic calibration from reference gestures");
    md.blank();

    md.heading(2, "Conclusion");
    if summary.average_detection_rate >= 0.7 {
        md.paragraph("The gestural interface showed adequate detection capability, validating the technology for interactive musical applications.");
    } else {
        md.paragraph("The analysis reveals significant room to improve gesture detection through calibration adjustments.");
    }
    md.heading(3, "Next steps");
    md.line("1. Apply the adjustments from the specific recommendations");
    md.line("2. Run validation tests with the new settings");
    md.line("3. Combine the results with the timing synchronisation analyses");
    md.line("4. Document the final settings for production use");
    md.blank();
    md.footer("gestures", &timestamp);
    md.finish()
}
