//! Synchronisation report

use super::{ms, Markdown};
use crate::config::{Config, SyncConfig};
use crate::deviation::PrecisionGrade;
use crate::output::{display_name, report_timestamp};
use crate::sync::{RoleAnalysis, SyncAnalysis, SyncComparison, Winner};

const GESTURE_TITLE: &str = "Web Theremin (pinch gesture)";
const CONTROL_TITLE: &str = "MIDI keyboard (control)";

fn winner_name(winner: Winner) -> &'static str {
    match winner {
        Winner::Gesture => "Web Theremin",
        Winner::Control => "MIDI keyboard",
    }
}

fn direction(offset_ms: f64) -> &'static str {
    if offset_ms > 0.0 {
        "delay"
    } else {
        "anticipation"
    }
}

fn metrics_table(md: &mut Markdown, role: &RoleAnalysis) {
    let m = &role.metrics;
    let mut rows = vec![
        vec!["**Events analysed**".to_string(), m.count.to_string()],
        vec!["**Systematic offset**".to_string(), ms(m.offset_ms)],
        vec!["**Real precision (σ)**".to_string(), ms(m.real_precision_ms)],
        vec!["**Corrected precision**".to_string(), ms(m.corrected_precision_ms)],
        vec!["**Mean absolute deviation**".to_string(), ms(m.mean_absolute_deviation_ms)],
    ];
    if let Some(extremes) = role.extremes {
        rows.push(vec!["**Largest delay**".to_string(), ms(extremes.latest_ms)]);
        rows.push(vec!["**Largest anticipation**".to_string(), ms(extremes.earliest_ms)]);
    }
    md.table(&["Metric", "Value"], &rows);
}

fn gesture_section(md: &mut Markdown, role: &RoleAnalysis, config: &SyncConfig) {
    md.heading(3, GESTURE_TITLE);
    if !role.has_data() {
        md.paragraph("**Status:** No gesture events detected in the MIDI file.");
        return;
    }
    metrics_table(md, role);

    let m = &role.metrics;
    let latency_note = if m.offset_ms.abs() > config.latency_warning_ms {
        "(possible processing latency)"
    } else {
        "(adequate timing)"
    };
    md.line("**Interpretation:**");
    md.bullet(&format!(
        "**Systematic offset:** {} indicates systematic {} {}",
        ms(m.offset_ms),
        direction(m.offset_ms),
        latency_note
    ));
    md.bullet(&format!(
        "**Real precision:** {} is the actual timing variability (lower is more precise)",
        ms(m.real_precision_ms)
    ));
    md.bullet(&format!(
        "**Corrected precision:** {} is the precision after removing the systematic offset",
        ms(m.corrected_precision_ms)
    ));
    md.bullet(&format!(
        "**Quality:** {} for a gestural interface",
        PrecisionGrade::from_precision(m.real_precision_ms, config).label()
    ));
    md.blank();
}

fn control_section(md: &mut Markdown, role: &RoleAnalysis) {
    md.heading(3, CONTROL_TITLE);
    if !role.has_data() {
        md.paragraph("**Status:** No keyboard events detected in the MIDI file.");
        return;
    }
    metrics_table(md, role);

    let m = &role.metrics;
    md.line("**Interpretation:**");
    md.bullet(&format!(
        "**Systematic offset:** {} shows the {} typical of a MIDI controller",
        ms(m.offset_ms),
        direction(m.offset_ms)
    ));
    md.bullet(&format!(
        "**Real precision:** {} is the variability baseline for traditional controllers",
        ms(m.real_precision_ms)
    ));
    md.bullet("**Experimental control:** used as the reference for the gestural interface");
    md.blank();
}

fn comparison_section(md: &mut Markdown, cmp: &SyncComparison, config: &SyncConfig) {
    let gp = cmp.gesture_precision_ms;
    let cp = cmp.control_precision_ms;
    let go = cmp.gesture_abs_offset_ms;
    let co = cmp.control_abs_offset_ms;

    md.heading(2, "Comparative Analysis");
    md.heading(3, "Real precision comparison (variability)");
    md.table(
        &["Metric", "Web Theremin", "MIDI keyboard", "Better"],
        &[
            vec![
                "**Real precision (σ)**".to_string(),
                ms(gp),
                ms(cp),
                winner_name(cmp.better_precision).to_string(),
            ],
            vec![
                "**Systematic offset**".to_string(),
                ms(go),
                ms(co),
                winner_name(cmp.smaller_offset).to_string(),
            ],
            vec![
                "**Precision difference**".to_string(),
                ms(cmp.precision_difference_ms),
                "-".to_string(),
                "-".to_string(),
            ],
            vec![
                "**Relative efficiency**".to_string(),
                format!("{:.1}%", cmp.relative_efficiency_pct),
                "-".to_string(),
                "-".to_string(),
            ],
        ],
    );

    md.heading(3, "Interpretation of the results");
    md.line("**Precision analysis (timing variability):**");
    md.blank();
    if gp < cp {
        md.line("The Web Theremin showed **better real precision** than the MIDI keyboard:");
        md.bullet(&format!(
            "Variability {:.1}% lower than the traditional control",
            cmp.improvement_pct()
        ));
        md.bullet(&format!(
            "Difference of {} in timing consistency",
            ms(cmp.precision_difference_ms)
        ));
        md.bullet("Gestural interface more stable than expected for this kind of technology");
    } else if cmp.precision_difference_ms < config.similarity_threshold_ms {
        md.line("Both instruments showed **similar precision**:");
        md.bullet(&format!(
            "Only {} difference in variability",
            ms(cmp.precision_difference_ms)
        ));
        md.bullet(&format!("Web Theremin ({}) vs keyboard ({})", ms(gp), ms(cp)));
        md.bullet("Comparable performance between gestural interface and traditional control");
    } else {
        md.line("The MIDI keyboard showed **better real precision**:");
        md.bullet(&format!(
            "Variability {:.1}% lower than the gestural interface",
            cmp.improvement_pct()
        ));
        md.bullet(&format!(
            "The {} difference can be optimised",
            ms(cmp.precision_difference_ms)
        ));
        md.bullet("Room for improvement in gesture processing");
    }
    md.blank();

    md.paragraph("**Systematic offset analysis:**");
    if cmp.offset_difference_ms < config.similarity_threshold_ms {
        md.paragraph(&format!(
            "Both instruments show similar offsets ({} vs {}), indicating comparable processing latencies.",
            ms(go),
            ms(co)
        ));
    } else if go > co {
        md.line(&format!(
            "The Web Theremin has a larger systematic offset ({} vs {}):",
            ms(go),
            ms(co)
        ));
        md.bullet(&format!(
            "The {} difference may indicate gesture processing latency",
            ms(cmp.offset_difference_ms)
        ));
        md.bullet("**Important:** this offset can be corrected by software calibration");
        md.bullet("It does not affect the relative precision of the instrument");
        md.blank();
    } else {
        md.paragraph(&format!(
            "The Web Theremin has a smaller systematic offset ({} vs {}), showing better timing efficiency.",
            ms(go),
            ms(co)
        ));
    }

    md.heading(3, "Comparison conclusion");
    let text = match (gp < cp, go < co) {
        (true, true) => format!(
            "The Web Theremin showed **superior performance** on both metrics: better precision ({} vs {}) and smaller offset ({} vs {}).",
            ms(gp),
            ms(cp),
            ms(go),
            ms(co)
        ),
        (true, false) => format!(
            "The Web Theremin showed **superior precision** ({} vs {}) but a larger systematic offset. With proper calibration it can outperform traditional controllers.",
            ms(gp),
            ms(cp)
        ),
        (false, true) => "The Web Theremin showed **better systematic timing** but slightly lower precision. It is a viable alternative to traditional controllers.".to_string(),
        (false, false) => "The MIDI keyboard performed better on both metrics, but the Web Theremin shows significant potential as a gestural interface given the complexity of the technology involved.".to_string(),
    };
    md.paragraph(&text);
}

/// Recommendation bullets for the gesture role
pub fn recommendations(gesture: &RoleAnalysis, config: &SyncConfig) -> Vec<String> {
    let mut items = Vec::new();
    if !gesture.has_data() {
        return items;
    }
    let m = &gesture.metrics;
    if m.offset_ms.abs() > config.calibration_offset_ms {
        if m.offset_ms > 0.0 {
            items.push(format!(
                "**Optimise latency:** mean delay of {} suggests the processing pipeline needs optimisation",
                ms(m.offset_ms)
            ));
        } else {
            items.push(format!(
                "**Calibrate anticipation:** mean anticipation of {} may indicate timing over-compensation",
                ms(m.offset_ms.abs())
            ));
        }
    }
    if m.real_precision_ms > config.consistency_warning_ms {
        items.push(format!(
            "**Improve consistency:** standard deviation of {} indicates high timing variability",
            ms(m.real_precision_ms)
        ));
    }
    if m.count < config.min_events_for_confidence {
        items.push(
            "**Increase the sample:** few gesture events detected, consider longer test sessions"
                .to_string(),
        );
    }
    items
}

/// Render the full synchronisation report
pub fn render(analysis: &SyncAnalysis, config: &Config) -> String {
    let sync = &config.sync;
    let roles = &config.roles;
    let mut md = Markdown::new();

    md.heading(1, "Gesture-Music Synchronisation Analysis Report");
    md.line(&format!("**Analysis date:** {}  ", report_timestamp()));
    md.line(&format!("**MIDI file:** `{}`", display_name(&analysis.source_file)));
    md.blank();

    md.heading(2, "Executive Summary");
    md.paragraph(
        "This report compares the timing of the gestural control (Web Theremin) with a traditional MIDI controller (keyboard), using a metronome as the timing reference.",
    );

    md.heading(2, "Methodology");
    md.bullet(&format!("**Timing reference:** metronome (MIDI note {})", roles.reference_note));
    md.bullet(&format!("**Pinch gesture:** Web Theremin (MIDI note {})", roles.gesture_note));
    md.bullet(&format!("**Traditional control:** MIDI keyboard (MIDI note {})", roles.control_note));
    md.bullet("**Metric:** timing deviation in milliseconds between musical events and the reference");
    md.blank();

    md.heading(2, "Detailed Results");
    gesture_section(&mut md, &analysis.gesture, sync);
    control_section(&mut md, &analysis.control);

    if let Some(cmp) = &analysis.comparison {
        comparison_section(&mut md, cmp, sync);
    }

    md.heading(2, "Recommendations");
    md.heading(3, "Gestural interface development");
    for item in recommendations(&analysis.gesture, sync) {
        md.bullet(&item);
    }
    md.blank();
    md.heading(3, "Future analyses");
    md.bullet("Expand the dataset with multiple users and sessions");
    md.bullet("Analyse performance at different metronome BPMs");
    md.bullet("Compare with other kinds of gestural controllers");
    md.bullet("Analyse timing fatigue over extended sessions");
    md.blank();

    md.heading(2, "Conclusion");
    let conclusion = match &analysis.comparison {
        Some(cmp) if cmp.better_precision == Winner::Gesture => {
            "The gestural interface outperformed the traditional control, validating gesture recognition for real-time musical applications."
        }
        Some(_) => {
            "Although the traditional control was more precise, the gestural interface shows promising results with room for optimisation."
        }
        None => {
            "Limited analysis: events are missing for one or both control modalities. Collect new data with a revised experimental protocol."
        }
    };
    md.paragraph(conclusion);
    md.footer("sync", &report_timestamp());
    md.finish()
}
