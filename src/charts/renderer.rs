//! Static Chart Renderer
//! Renders report charts to PNG images with plotters.
//!
//! Charts are drawn into an in-memory RGB buffer and encoded with `image`,
//! so the same bytes can be written to disk or handed to another consumer.

use crate::report::{ChartSpec, Report};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Invalid image size {0}x{1}")]
    Size(u32, u32),
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Y range used when the chart does not pin one: from zero (or the
    /// lowest negative value) to 10% above the maximum.
    pub fn y_range(chart: &ChartSpec) -> (f64, f64) {
        if let Some(range) = chart.y_range {
            return range;
        }
        let values = chart
            .series
            .iter()
            .flat_map(|s| s.points.iter().flatten().copied())
            .filter(|v| v.is_finite());
        let (min, max) = values.fold((0.0f64, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !max.is_finite() || max <= min {
            return (min, min + 1.0);
        }
        (min, max * 1.1)
    }

    /// Render one chart to PNG bytes.
    pub fn render_png(chart: &ChartSpec, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::Size(width, height));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::draw(&root, chart).map_err(|e| RenderError::Draw(e.to_string()))?;
        }

        let image = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Size(width, height))?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Write every chart of `report` as `<stem>.png` under `dir`.
    pub fn export_report(
        report: &Report,
        dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<Vec<PathBuf>, RenderError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (stem, chart) in report.charts() {
            let path = dir.join(format!("{stem}.png"));
            std::fs::write(&path, Self::render_png(chart, width, height)?)?;
            written.push(path);
        }
        info!(dir = %dir.display(), charts = written.len(), "Exported chart images");
        Ok(written)
    }

    fn draw<DB>(root: &DrawingArea<DB, Shift>, chart: &ChartSpec) -> Result<(), Box<dyn std::error::Error>>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let n = chart.categories.len().max(1);
        let (y_min, y_max) = Self::y_range(chart);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_min..y_max)?;

        let categories = &chart.categories;
        let label = |x: &f64| super::plotter::category_label(categories, *x);
        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&label)
            .y_desc(chart.y_title.as_str())
            .draw()?;

        for series in &chart.series {
            let color = RGBColor(series.color.0, series.color.1, series.color.2);

            for (i, segment) in series.segments().into_iter().enumerate() {
                let drawn = ctx.draw_series(LineSeries::new(segment, color.stroke_width(2)))?;
                if i == 0 {
                    drawn.label(series.name.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
            }

            ctx.draw_series(
                series
                    .points_xy()
                    .into_iter()
                    .map(|p| Circle::new(p, 3, color.filled())),
            )?;
        }

        if !chart.series.is_empty() {
            ctx.configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK.mix(0.3))
                .position(SeriesLabelPosition::UpperRight)
                .draw()?;
        }

        root.present()?;
        Ok(())
    }
}
