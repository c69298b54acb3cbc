//! Static chart rendering
//!
//! Every chart implements [`Chart`] once, generically over the plotters
//! backend, and [`save_chart`] draws it to PNG and/or SVG.

pub mod gestures;
pub mod sync;
pub mod trace;

use crate::error::AnalysisError;
use crate::output::{ArtifactLog, ImageFormat};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

pub(crate) const GESTURE_COLOR: RGBColor = RGBColor(231, 76, 60);
pub(crate) const CONTROL_COLOR: RGBColor = RGBColor(52, 152, 219);
pub(crate) const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(148, 103, 189),
];

/// A chart that can draw itself on any plotters backend
pub trait Chart {
    /// Name used in log messages
    fn name(&self) -> &str;

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> crate::Result<()>;
}

/// Render `chart` to `<stem>.<ext>` for every extension of `format`.
///
/// Each format is attempted independently; failures are recorded, not returned.
pub fn save_chart<C: Chart>(
    chart: &C,
    stem: &Path,
    format: ImageFormat,
    size: (u32, u32),
) -> ArtifactLog {
    let mut artifacts = ArtifactLog::default();

    for ext in format.extensions() {
        let path = stem.with_extension(ext);
        let outcome = match *ext {
            "svg" => {
                let root = SVGBackend::new(&path, size).into_drawing_area();
                draw_and_present(chart, &root)
            }
            _ => {
                let root = BitMapBackend::new(&path, size).into_drawing_area();
                draw_and_present(chart, &root)
            }
        };
        artifacts.record(format!("{} chart ({})", chart.name(), ext), outcome.map(|_| path));
    }

    artifacts
}

fn draw_and_present<C: Chart, DB: DrawingBackend>(
    chart: &C,
    root: &DrawingArea<DB, Shift>,
) -> crate::Result<()> {
    root.fill(&WHITE).map_err(chart_error("fill background"))?;
    chart.draw(root)?;
    root.present().map_err(chart_error("write image"))?;
    Ok(())
}

/// Map a plotters error into the crate error with some context
pub(crate) fn chart_error<E: std::fmt::Debug>(context: &'static str) -> impl Fn(E) -> AnalysisError {
    move |e| AnalysisError::ChartRender(format!("{}: {:?}", context, e))
}

/// Draw a block of monospace text lines starting at a pixel position
pub(crate) fn draw_text_block<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    lines: &[String],
    origin: (i32, i32),
    font_size: u32,
) -> crate::Result<()> {
    let style = TextStyle::from(("monospace", font_size).into_font());
    let line_height = (font_size as f64 * 1.4) as i32;
    for (i, line) in lines.iter().enumerate() {
        area.draw_text(line, &style, (origin.0, origin.1 + i as i32 * line_height))
            .map_err(chart_error("draw text"))?;
    }
    Ok(())
}

/// Pad a value range so single-valued data still yields a drawable axis
pub(crate) fn padded_range(lo: f64, hi: f64, pad_ratio: f64) -> std::ops::Range<f64> {
    if !(lo.is_finite() && hi.is_finite()) {
        return 0.0..1.0;
    }
    let span = hi - lo;
    let pad = if span > 0.0 { span * pad_ratio } else { lo.abs().max(1.0) * 0.1 };
    (lo - pad)..(hi + pad)
}
