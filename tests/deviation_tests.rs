//! Validation tests for deviation calculation and precision metrics

use theremin_lab::config::SyncConfig;
use theremin_lab::deviation::{
    deviations, nearest_reference_index, DeviationExtremes, PrecisionGrade, PrecisionMetrics,
};

const EPS: f64 = 1e-6;

/// Metronome grid with `n` clicks every `period` seconds
fn generate_grid(n: usize, period: f64) -> Vec<f64> {
    (0..n).map(|i| i as f64 * period).collect()
}

fn assert_close(actual: f64, expected: f64, what: &str) {
    assert!(
        (actual - expected).abs() < EPS,
        "{}: expected {:.6}, got {:.6}",
        what,
        expected,
        actual
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_inputs() {
        assert!(deviations(&[], &[1.0, 2.0]).is_empty());
        assert!(deviations(&[1.0], &[]).is_empty());
        assert!(deviations(&[], &[]).is_empty());
        assert_eq!(nearest_reference_index(&[], 1.0), None);
    }

    #[test]
    fn test_nearest_neighbor_deviation() {
        let result = deviations(&[1.4], &[1.0, 2.0, 3.0]);
        assert_eq!(result.len(), 1);
        assert_close(result[0], 400.0, "1.4s against 1.0s");
    }

    #[test]
    fn test_tie_picks_lowest_index() {
        assert_eq!(nearest_reference_index(&[1.0, 3.0], 2.0), Some(0));

        let result = deviations(&[2.0], &[1.0, 3.0]);
        assert_close(result[0], 1000.0, "Equidistant source resolves to the earlier click");
    }

    #[test]
    fn test_full_scan_on_unsorted_reference() {
        // Nearest is found regardless of reference order
        let reference = [3.0, 0.0, 1.0, 2.0];
        assert_eq!(nearest_reference_index(&reference, 0.9), Some(2));

        let result = deviations(&[0.9, 2.95], &reference);
        assert_close(result[0], -100.0, "0.9s early against 1.0s");
        assert_close(result[1], -50.0, "2.95s early against 3.0s");
    }

    #[test]
    fn test_output_follows_source_order() {
        let reference = generate_grid(8, 0.5);
        let source = [3.01, 0.49, 1.52];
        let result = deviations(&source, &reference);

        assert_eq!(result.len(), 3);
        assert_close(result[0], 10.0, "first");
        assert_close(result[1], -10.0, "second");
        assert_close(result[2], 20.0, "third");
    }

    #[test]
    fn test_precision_metrics_worked_example() {
        let reference = [0.0, 0.5, 1.0, 1.5];
        let gesture = [0.02, 0.51, 1.03];

        let result = deviations(&gesture, &reference);
        assert_close(result[0], 20.0, "d0");
        assert_close(result[1], 10.0, "d1");
        assert_close(result[2], 30.0, "d2");

        let metrics = PrecisionMetrics::from_deviations(&result);
        println!("Worked example metrics: {:?}", metrics);

        assert_close(metrics.offset_ms, 20.0, "offset");
        assert!((metrics.real_precision_ms - 8.165).abs() < 1e-3);
        assert_close(metrics.mean_absolute_deviation_ms, 20.0, "mean absolute deviation");
        assert_eq!(metrics.count, 3);
    }

    #[test]
    fn test_corrected_precision_matches_real_precision() {
        let samples: [&[f64]; 4] = [
            &[20.0, 10.0, 30.0],
            &[-45.5, 12.25, 3.0, 99.0, -7.0],
            &[5.0],
            &[1e4, -1e4, 0.5],
        ];
        for data in samples {
            let m = PrecisionMetrics::from_deviations(data);
            assert!(
                (m.corrected_precision_ms - m.real_precision_ms).abs() < 1e-9 * m.real_precision_ms.max(1.0),
                "Corrected {} vs real {}",
                m.corrected_precision_ms,
                m.real_precision_ms
            );
        }
    }

    #[test]
    fn test_population_standard_deviation() {
        let m = PrecisionMetrics::from_deviations(&[-10.0, 10.0]);
        assert_close(m.real_precision_ms, 10.0, "population std of +-10");
        assert_close(m.offset_ms, 0.0, "offset");
        assert_close(m.mean_absolute_deviation_ms, 10.0, "MAD");
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = PrecisionMetrics::from_deviations(&[]);
        assert_eq!(m, PrecisionMetrics::default());
        assert_eq!(m.count, 0);
        assert_eq!(m.real_precision_ms, 0.0);
        assert!(DeviationExtremes::from_deviations(&[]).is_none());
    }

    #[test]
    fn test_extremes() {
        let extremes = DeviationExtremes::from_deviations(&[12.0, -40.0, 7.5, 3.0])
            .expect("non-empty deviations have extremes");
        assert_eq!(extremes.earliest_ms, -40.0);
        assert_eq!(extremes.latest_ms, 12.0);
    }

    #[test]
    fn test_precision_grades() {
        let config = SyncConfig::default();
        assert_eq!(PrecisionGrade::from_precision(8.0, &config), PrecisionGrade::Excellent);
        assert_eq!(PrecisionGrade::from_precision(50.0, &config), PrecisionGrade::Good);
        assert_eq!(PrecisionGrade::from_precision(120.0, &config), PrecisionGrade::Moderate);
        assert_eq!(PrecisionGrade::from_precision(150.0, &config), PrecisionGrade::Low);
        assert_eq!(PrecisionGrade::Excellent.label(), "Excellent precision");
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let reference = vec![2.0, 1.0, 0.0];
        let source = vec![0.1, 1.9];
        let _ = deviations(&source, &reference);
        assert_eq!(reference, vec![2.0, 1.0, 0.0]);
        assert_eq!(source, vec![0.1, 1.9]);
    }
}
