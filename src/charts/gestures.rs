//! Per-section gesture timeline charts

use super::{chart_error, Chart, SERIES_COLORS};
use crate::gestures::{short_gesture_name, SimultaneousSection, SingleSection, TimeWindow};
use plotters::coord::Shift;
use plotters::prelude::*;

const NOTE_COLOR: RGBColor = RGBColor(31, 119, 180);
const CC_COLORS: [RGBColor; 2] = [RGBColor(255, 127, 14), RGBColor(44, 160, 44)];
const WINDOW_MARGIN_S: f64 = 0.5;

fn x_range(window: &TimeWindow) -> std::ops::Range<f64> {
    (window.start_s - WINDOW_MARGIN_S)..(window.end_s + WINDOW_MARGIN_S)
}

/// note_on events of a section as pitch ticks over time
pub struct NoteSectionChart<'a> {
    section: &'a SingleSection,
    note_axis: [u8; 2],
}

impl<'a> NoteSectionChart<'a> {
    pub fn new(section: &'a SingleSection, note_axis: [u8; 2]) -> Self {
        Self { section, note_axis }
    }
}

impl Chart for NoteSectionChart<'_> {
    fn name(&self) -> &str {
        &self.section.detection.gesture_name
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let title = format!("Test Section: {}", self.section.detection.gesture_name);
        let [low, high] = self.note_axis;

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range(&self.section.window), f64::from(low)..f64::from(high))
            .map_err(chart_error("build note chart"))?;

        chart
            .configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc("MIDI Note (Pitch)")
            .draw()
            .map_err(chart_error("draw note mesh"))?;

        chart
            .draw_series(self.section.detection.points.iter().map(|&(t, note)| {
                PathElement::new(vec![(t, note - 1.0), (t, note + 1.0)], NOTE_COLOR.stroke_width(3))
            }))
            .map_err(chart_error("draw note events"))?
            .label("Note On Events")
            .legend(|(x, y)| PathElement::new(vec![(x + 5, y - 6), (x + 5, y + 6)], NOTE_COLOR.stroke_width(3)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error("draw note legend"))?;
        Ok(())
    }
}

struct ControlSeries<'a> {
    label: String,
    points: &'a [(f64, f64)],
}

/// Control-change values over time, one line per expected controller
pub struct ControlSectionChart<'a> {
    title: String,
    y_desc: String,
    window: TimeWindow,
    series: Vec<ControlSeries<'a>>,
}

impl<'a> ControlSectionChart<'a> {
    pub fn single(section: &'a SingleSection) -> Self {
        let detection = &section.detection;
        let control = detection.control_number().unwrap_or(0);
        Self {
            title: format!("Test Section: {}", detection.gesture_name),
            y_desc: format!("Control Change {} Value (0-127)", control),
            window: section.window,
            series: vec![ControlSeries {
                label: format!("CC {}", control),
                points: &detection.points,
            }],
        }
    }

    /// Combined chart; subsections without control-change data are left out
    pub fn simultaneous(section: &'a SimultaneousSection) -> Self {
        let series = section
            .subsections
            .iter()
            .filter(|d| !d.points.is_empty())
            .filter_map(|d| {
                let control = d.control_number()?;
                Some(ControlSeries {
                    label: format!("CC {} ({})", control, short_gesture_name(&d.gesture_name)),
                    points: &d.points,
                })
            })
            .collect();

        let title = section
            .name
            .strip_prefix("Simultaneous: ")
            .map(|names| format!("Simultaneous Gestures: {}", names))
            .unwrap_or_else(|| section.name.clone());

        Self {
            title,
            y_desc: "Control Change Value (0-127)".to_string(),
            window: section.window,
            series,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Chart for ControlSectionChart<'_> {
    fn name(&self) -> &str {
        &self.title
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()> {
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 30))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range(&self.window), 0.0..128.0)
            .map_err(chart_error("build control chart"))?;

        chart
            .configure_mesh()
            .x_desc("Time (seconds)")
            .y_desc(self.y_desc.as_str())
            .draw()
            .map_err(chart_error("draw control mesh"))?;

        for (i, series) in self.series.iter().enumerate() {
            let color = CC_COLORS
                .get(i)
                .copied()
                .unwrap_or(SERIES_COLORS[i % SERIES_COLORS.len()]);
            chart
                .draw_series(LineSeries::new(series.points.iter().copied(), color.stroke_width(2)))
                .map_err(chart_error("draw control values"))?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error("draw control legend"))?;
        Ok(())
    }
}
