//! Trace FPS charts

use super::{chart_error, padded_range, Chart, SERIES_COLORS};
use crate::stats;
use crate::trace::{FpsBucket, TraceAnalysis};
use plotters::coord::Shift;
use plotters::prelude::*;

const TARGET_COLOR: RGBColor = RGBColor(214, 39, 40);
const HISTOGRAM_BINS: usize = 30;

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// FPS of every frame interval, with the target FPS line
pub struct FpsTimeline<'a> {
    analysis: &'a TraceAnalysis,
}

impl<'a> FpsTimeline<'a> {
    pub fn new(analysis: &'a TraceAnalysis) -> Self {
        Self { analysis }
    }
}

impl Chart for FpsTimeline<'_> {
    fn name(&self) -> &str {
        "fps_timeline"
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let fps_values = self.analysis.fps_values();
        let points: Vec<(f64, f64)> = fps_values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i as f64, v))
            .collect();
        let values = finite(&fps_values);
        let target = self.analysis.target_fps;
        let y_range = padded_range(
            stats::min(&values).unwrap_or(0.0).min(target),
            stats::max(&values).unwrap_or(target).max(target),
            0.1,
        );
        let x_max = fps_values.len().max(2) as f64 - 1.0;

        let mut chart = ChartBuilder::on(root)
            .caption("FPS over time", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, y_range)
            .map_err(chart_error("build fps timeline"))?;

        chart
            .configure_mesh()
            .x_desc("Frame index")
            .y_desc("FPS")
            .draw()
            .map_err(chart_error("draw fps timeline mesh"))?;

        chart
            .draw_series(LineSeries::new(points, SERIES_COLORS[0].stroke_width(2)))
            .map_err(chart_error("draw fps line"))?
            .label("FPS")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SERIES_COLORS[0]));

        chart
            .draw_series(LineSeries::new(
                vec![(0.0, target), (x_max, target)],
                TARGET_COLOR.stroke_width(2),
            ))
            .map_err(chart_error("draw target line"))?
            .label(format!("Target FPS ({})", target))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], TARGET_COLOR));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error("draw fps legend"))?;
        Ok(())
    }
}

/// Histogram of per-interval FPS
pub struct FpsDistributionChart<'a> {
    analysis: &'a TraceAnalysis,
}

impl<'a> FpsDistributionChart<'a> {
    pub fn new(analysis: &'a TraceAnalysis) -> Self {
        Self { analysis }
    }
}

impl Chart for FpsDistributionChart<'_> {
    fn name(&self) -> &str {
        "fps_distribution"
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let values = finite(&self.analysis.fps_values());
        let lo = stats::min(&values).unwrap_or(0.0);
        let mut hi = stats::max(&values).unwrap_or(1.0);
        if hi <= lo {
            hi = lo + 1.0;
        }
        let edges = stats::linspace(lo, hi, HISTOGRAM_BINS + 1);
        let counts = stats::histogram(&values, &edges);
        let peak = counts.iter().copied().max().unwrap_or(0).max(1);

        let mut chart = ChartBuilder::on(root)
            .caption("FPS distribution", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(lo..hi, 0.0..peak as f64 * 1.1)
            .map_err(chart_error("build fps histogram"))?;

        chart
            .configure_mesh()
            .x_desc("FPS")
            .y_desc("Frequency")
            .draw()
            .map_err(chart_error("draw fps histogram mesh"))?;

        chart
            .draw_series(counts.iter().zip(edges.windows(2)).map(|(&c, w)| {
                Rectangle::new([(w[0], 0.0), (w[1], c as f64)], SERIES_COLORS[1].mix(0.7).filled())
            }))
            .map_err(chart_error("draw fps histogram bars"))?;
        chart
            .draw_series(counts.iter().zip(edges.windows(2)).map(|(&c, w)| {
                Rectangle::new([(w[0], 0.0), (w[1], c as f64)], BLACK.stroke_width(1))
            }))
            .map_err(chart_error("draw fps histogram edges"))?;
        Ok(())
    }
}

/// Interval counts per FPS range
pub struct FpsBuckets<'a> {
    analysis: &'a TraceAnalysis,
}

impl<'a> FpsBuckets<'a> {
    pub fn new(analysis: &'a TraceAnalysis) -> Self {
        Self { analysis }
    }
}

impl Chart for FpsBuckets<'_> {
    fn name(&self) -> &str {
        "fps_buckets"
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let dist = &self.analysis.distribution;
        let counts: Vec<usize> = FpsBucket::ALL.iter().map(|&b| dist.count(b)).collect();
        let peak = counts.iter().copied().max().unwrap_or(0).max(1) as f64;
        let label_at = |x: &f64| -> String {
            let slot = x.round();
            if (x - slot).abs() < 1e-6 && slot >= 0.0 {
                FpsBucket::ALL
                    .get(slot as usize)
                    .map(|b| b.label().to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            }
        };

        let mut chart = ChartBuilder::on(root)
            .caption("Distribution by FPS range", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..FpsBucket::ALL.len() as f64 - 0.5, 0.0..peak * 1.15)
            .map_err(chart_error("build bucket chart"))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(FpsBucket::ALL.len())
            .x_label_formatter(&label_at)
            .x_desc("FPS range")
            .y_desc("Frames")
            .draw()
            .map_err(chart_error("draw bucket mesh"))?;

        chart
            .draw_series(counts.iter().enumerate().map(|(i, &c)| {
                let x = i as f64;
                Rectangle::new([(x - 0.35, 0.0), (x + 0.35, c as f64)], SERIES_COLORS[2].mix(0.7).filled())
            }))
            .map_err(chart_error("draw bucket bars"))?;

        chart
            .draw_series(counts.iter().enumerate().map(|(i, &c)| {
                Text::new(
                    format!("{} frames", c),
                    (i as f64 - 0.2, c as f64 + peak * 0.04),
                    ("sans-serif", 15).into_font(),
                )
            }))
            .map_err(chart_error("draw bucket labels"))?;
        Ok(())
    }
}

/// Processing duration of each measured frame
pub struct FrameDurationChart<'a> {
    analysis: &'a TraceAnalysis,
}

impl<'a> FrameDurationChart<'a> {
    pub fn new(analysis: &'a TraceAnalysis) -> Self {
        Self { analysis }
    }
}

impl Chart for FrameDurationChart<'_> {
    fn name(&self) -> &str {
        "frame_duration"
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let durations = &self.analysis.durations_ms;
        let y_range = padded_range(
            stats::min(durations).unwrap_or(0.0).min(0.0),
            stats::max(durations).unwrap_or(1.0),
            0.1,
        );
        let x_max = durations.len().max(2) as f64 - 1.0;
        let color = SERIES_COLORS[3];

        let mut chart = ChartBuilder::on(root)
            .caption("Processing duration per frame", ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, y_range)
            .map_err(chart_error("build duration chart"))?;

        chart
            .configure_mesh()
            .x_desc("Frame index")
            .y_desc("Duration (ms)")
            .draw()
            .map_err(chart_error("draw duration mesh"))?;

        chart
            .draw_series(LineSeries::new(
                durations.iter().enumerate().map(|(i, &d)| (i as f64, d)),
                color.stroke_width(2),
            ))
            .map_err(chart_error("draw duration line"))?
            .label("Duration (ms)")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error("draw duration legend"))?;
        Ok(())
    }
}
