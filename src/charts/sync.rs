//! Four-panel synchronisation dashboard

use super::{chart_error, draw_text_block, padded_range, Chart, CONTROL_COLOR, GESTURE_COLOR};
use crate::config::{Config, SyncConfig};
use crate::stats;
use crate::sync::{SyncAnalysis, Winner};
use plotters::coord::Shift;
use plotters::prelude::*;

struct Series<'a> {
    label: &'static str,
    color: RGBColor,
    values: &'a [f64],
}

/// Deviation scatter, density histogram, box comparison and summary text
pub struct SyncDashboard<'a> {
    analysis: &'a SyncAnalysis,
    config: &'a SyncConfig,
}

impl<'a> SyncDashboard<'a> {
    pub fn new(analysis: &'a SyncAnalysis, config: &'a Config) -> Self {
        Self {
            analysis,
            config: &config.sync,
        }
    }

    fn series(&self) -> Vec<Series<'a>> {
        let analysis: &'a SyncAnalysis = self.analysis;
        let mut series = Vec::new();
        if analysis.gesture.has_data() {
            series.push(Series {
                label: "Theremin (gesture)",
                color: GESTURE_COLOR,
                values: &analysis.gesture.deviations_ms,
            });
        }
        if analysis.control.has_data() {
            series.push(Series {
                label: "MIDI keyboard",
                color: CONTROL_COLOR,
                values: &analysis.control.deviations_ms,
            });
        }
        series
    }

    fn draw_scatter<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let series = self.series();
        let all: Vec<f64> = series.iter().flat_map(|s| s.values.iter().copied()).collect();
        let max_len = series.iter().map(|s| s.values.len()).max().unwrap_or(1).max(1);
        let y_range = padded_range(
            stats::min(&all).unwrap_or(-1.0).min(0.0),
            stats::max(&all).unwrap_or(1.0).max(0.0),
            0.1,
        );

        let mut chart = ChartBuilder::on(area)
            .caption("Timing deviation per event", ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(-0.5f64..max_len as f64 - 0.5, y_range)
            .map_err(chart_error("build scatter"))?;

        chart
            .configure_mesh()
            .x_desc("Event index")
            .y_desc("Deviation (ms)")
            .draw()
            .map_err(chart_error("draw scatter mesh"))?;

        chart
            .draw_series(LineSeries::new(
                vec![(-0.5, 0.0), (max_len as f64 - 0.5, 0.0)],
                BLACK.mix(0.5),
            ))
            .map_err(chart_error("draw zero line"))?;

        for s in &series {
            let color = s.color;
            chart
                .draw_series(
                    s.values
                        .iter()
                        .enumerate()
                        .map(|(i, &d)| Circle::new((i as f64, d), 5, color.mix(0.7).filled())),
                )
                .map_err(chart_error("draw deviations"))?
                .label(s.label)
                .legend(move |(x, y)| Circle::new((x + 5, y), 5, color.filled()));
        }

        if !series.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(chart_error("draw legend"))?;
        }
        Ok(())
    }

    fn draw_histogram<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let [lo, hi] = self.config.histogram_range_ms;
        let edges = stats::linspace(lo, hi, self.config.histogram_edges);
        let series = self.series();

        let densities: Vec<Vec<f64>> = series
            .iter()
            .map(|s| {
                let counts = stats::histogram(s.values, &edges);
                let total: usize = counts.iter().sum();
                counts
                    .iter()
                    .zip(edges.windows(2))
                    .map(|(&c, w)| {
                        if total == 0 {
                            0.0
                        } else {
                            c as f64 / (total as f64 * (w[1] - w[0]))
                        }
                    })
                    .collect()
            })
            .collect();

        let peak = densities
            .iter()
            .flat_map(|d| d.iter().copied())
            .fold(0.0f64, f64::max);
        let y_max = if peak > 0.0 { peak * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(area)
            .caption("Deviation distribution", ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(65)
            .build_cartesian_2d(lo..hi, 0.0..y_max)
            .map_err(chart_error("build histogram"))?;

        chart
            .configure_mesh()
            .x_desc("Deviation (ms)")
            .y_desc("Density")
            .draw()
            .map_err(chart_error("draw histogram mesh"))?;

        for (s, density) in series.iter().zip(&densities) {
            let color = s.color;
            chart
                .draw_series(density.iter().zip(edges.windows(2)).map(|(&d, w)| {
                    Rectangle::new([(w[0], 0.0), (w[1], d)], color.mix(0.6).filled())
                }))
                .map_err(chart_error("draw histogram bars"))?
                .label(s.label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .draw_series(LineSeries::new(vec![(0.0, 0.0), (0.0, y_max)], BLACK.mix(0.5)))
            .map_err(chart_error("draw zero line"))?;

        if !series.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(chart_error("draw legend"))?;
        }
        Ok(())
    }

    fn draw_boxes<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let series = self.series();
        let all: Vec<f64> = series.iter().flat_map(|s| s.values.iter().copied()).collect();
        let y_range = padded_range(
            stats::min(&all).unwrap_or(-1.0).min(0.0),
            stats::max(&all).unwrap_or(1.0).max(0.0),
            0.1,
        );
        let labels: Vec<&str> = series.iter().map(|s| s.label).collect();
        let label_at = |x: &f64| -> String {
            let slot = x.round();
            if (x - slot).abs() < 1e-6 && slot >= 1.0 {
                labels.get(slot as usize - 1).map(|l| l.to_string()).unwrap_or_default()
            } else {
                String::new()
            }
        };

        let mut chart = ChartBuilder::on(area)
            .caption("Statistical comparison", ("sans-serif", 20))
            .margin(15)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(0.0f64..series.len() as f64 + 1.0, y_range)
            .map_err(chart_error("build box plot"))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(series.len() + 2)
            .x_label_formatter(&label_at)
            .y_desc("Deviation (ms)")
            .draw()
            .map_err(chart_error("draw box mesh"))?;

        for (i, s) in series.iter().enumerate() {
            let x = i as f64 + 1.0;
            let q1 = stats::percentile(s.values, 25.0);
            let median = stats::percentile(s.values, 50.0);
            let q3 = stats::percentile(s.values, 75.0);
            let iqr = q3 - q1;
            let inliers: Vec<f64> = s
                .values
                .iter()
                .copied()
                .filter(|&v| v >= q1 - 1.5 * iqr && v <= q3 + 1.5 * iqr)
                .collect();
            let low = stats::min(&inliers).unwrap_or(q1);
            let high = stats::max(&inliers).unwrap_or(q3);

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.25, q1), (x + 0.25, q3)],
                    s.color.mix(0.6).filled(),
                )))
                .map_err(chart_error("draw box"))?;
            chart
                .draw_series(
                    [
                        vec![(x - 0.25, median), (x + 0.25, median)],
                        vec![(x, q3), (x, high)],
                        vec![(x, q1), (x, low)],
                        vec![(x - 0.1, high), (x + 0.1, high)],
                        vec![(x - 0.1, low), (x + 0.1, low)],
                    ]
                    .into_iter()
                    .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
                )
                .map_err(chart_error("draw whiskers"))?;
            chart
                .draw_series(
                    s.values
                        .iter()
                        .filter(|&&v| v < low || v > high)
                        .map(|&v| Circle::new((x, v), 4, BLACK)),
                )
                .map_err(chart_error("draw outliers"))?;
        }

        chart
            .draw_series(LineSeries::new(
                vec![(0.0, 0.0), (series.len() as f64 + 1.0, 0.0)],
                BLACK.mix(0.5),
            ))
            .map_err(chart_error("draw zero line"))?;
        Ok(())
    }

    /// Text of the statistics panel
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec!["Synchronisation statistics".to_string(), String::new()];
        for (title, role) in [
            ("THEREMIN (pinch gesture):", &self.analysis.gesture),
            ("MIDI KEYBOARD (control):", &self.analysis.control),
        ] {
            if !role.has_data() {
                continue;
            }
            let m = &role.metrics;
            lines.push(title.to_string());
            lines.push(format!("  - Systematic offset: {:.2} ms", m.offset_ms));
            lines.push(format!("  - Real precision: {:.2} ms", m.real_precision_ms));
            lines.push(format!("  - Corrected precision: {:.2} ms", m.corrected_precision_ms));
            lines.push(format!("  - Events analysed: {}", m.count));
            lines.push(String::new());
        }

        if let Some(cmp) = &self.analysis.comparison {
            let name = |w: Winner| match w {
                Winner::Gesture => "Theremin",
                Winner::Control => "Keyboard",
            };
            lines.push("COMPARISON (real precision):".to_string());
            lines.push(format!("  - More precise instrument: {}", name(cmp.better_precision)));
            lines.push(format!("  - Precision difference: {:.2} ms", cmp.precision_difference_ms));
            // The panel credits the gesture role when offsets tie
            let smaller_offset = if cmp.control_abs_offset_ms < cmp.gesture_abs_offset_ms {
                Winner::Control
            } else {
                Winner::Gesture
            };
            lines.push(format!("  - Smaller offset: {}", name(smaller_offset)));
            lines.push(format!("  - Offset difference: {:.2} ms", cmp.offset_difference_ms));
        }
        lines
    }

    fn draw_summary<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let (w, h) = area.dim_in_pixel();
        area.draw(&Rectangle::new(
            [(20, 20), (w as i32 - 20, h as i32 - 20)],
            RGBColor(211, 211, 211).mix(0.8).filled(),
        ))
        .map_err(chart_error("draw summary background"))?;
        draw_text_block(area, &self.summary_lines(), (40, 40), 16)
    }
}

impl Chart for SyncDashboard<'_> {
    fn name(&self) -> &str {
        "sync"
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let root = root
            .titled("Gesture-Music Synchronisation Analysis", ("sans-serif", 32))
            .map_err(chart_error("draw title"))?;
        let panels = root.split_evenly((2, 2));

        self.draw_scatter(&panels[0])?;
        self.draw_histogram(&panels[1])?;
        self.draw_boxes(&panels[2])?;
        self.draw_summary(&panels[3])?;
        Ok(())
    }
}
