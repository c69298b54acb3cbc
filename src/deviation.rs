//! Timing deviation against the metronome and the precision metrics derived from it

use crate::config::SyncConfig;
use crate::stats;
use serde::Serialize;

/// Index of the reference onset closest to `time_sec`.
///
/// Scans the whole reference sequence. On an exact tie the lowest index wins,
/// callers rely on this to get reproducible deviations.
pub fn nearest_reference_index(reference: &[f64], time_sec: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &r) in reference.iter().enumerate() {
        let distance = (r - time_sec).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// Signed deviation in milliseconds of every source onset from its nearest
/// reference onset. Positive means late.
pub fn deviations(source: &[f64], reference: &[f64]) -> Vec<f64> {
    if source.is_empty() || reference.is_empty() {
        return Vec::new();
    }

    source
        .iter()
        .filter_map(|&t| {
            nearest_reference_index(reference, t).map(|i| (t - reference[i]) * 1000.0)
        })
        .collect()
}

/// Offset and precision summary of a deviation set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PrecisionMetrics {
    /// Systematic offset: mean signed deviation
    pub offset_ms: f64,
    /// Population std dev of the raw deviations
    pub real_precision_ms: f64,
    /// Population std dev after removing the offset
    pub corrected_precision_ms: f64,
    pub mean_absolute_deviation_ms: f64,
    pub count: usize,
}

impl PrecisionMetrics {
    pub fn from_deviations(deviations: &[f64]) -> Self {
        if deviations.is_empty() {
            return Self::default();
        }

        let offset_ms = stats::mean(deviations);
        let real_precision_ms = stats::std_dev(deviations);
        let absolute: Vec<f64> = deviations.iter().map(|d| d.abs()).collect();
        let mean_absolute_deviation_ms = stats::mean(&absolute);

        // Reported separately from real precision; equal up to rounding
        let centred: Vec<f64> = deviations.iter().map(|d| d - offset_ms).collect();
        let corrected_precision_ms = stats::std_dev(&centred);

        Self {
            offset_ms,
            real_precision_ms,
            corrected_precision_ms,
            mean_absolute_deviation_ms,
            count: deviations.len(),
        }
    }
}

/// Earliest and latest deviation of a non-empty set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviationExtremes {
    /// Most anticipated onset (minimum deviation)
    pub earliest_ms: f64,
    /// Most delayed onset (maximum deviation)
    pub latest_ms: f64,
}

impl DeviationExtremes {
    pub fn from_deviations(deviations: &[f64]) -> Option<Self> {
        Some(Self {
            earliest_ms: stats::min(deviations)?,
            latest_ms: stats::max(deviations)?,
        })
    }
}

/// Qualitative grade of a real-precision value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrecisionGrade {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl PrecisionGrade {
    pub fn from_precision(precision_ms: f64, config: &SyncConfig) -> Self {
        let [excellent, good, moderate] = config.grade_thresholds_ms;
        if precision_ms < excellent {
            PrecisionGrade::Excellent
        } else if precision_ms < good {
            PrecisionGrade::Good
        } else if precision_ms < moderate {
            PrecisionGrade::Moderate
        } else {
            PrecisionGrade::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PrecisionGrade::Excellent => "Excellent precision",
            PrecisionGrade::Good => "Good precision",
            PrecisionGrade::Moderate => "Moderate precision",
            PrecisionGrade::Low => "Low precision",
        }
    }
}
