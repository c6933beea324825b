//! Chart Plotter Module
//! Draws report charts interactively using egui_plot.

use crate::data::Rgb;
use crate::report::ChartSpec;
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

pub fn color32(color: Rgb) -> Color32 {
    Color32::from_rgb(color.0, color.1, color.2)
}

/// Label for an x-axis grid mark; only whole category indices get one.
pub fn category_label(categories: &[String], value: f64) -> String {
    let idx = value.round();
    if idx < 0.0 || (value - idx).abs() > 1e-6 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

/// Draws [`ChartSpec`]s as line charts with markers.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn draw_line_chart(ui: &mut egui::Ui, id: &str, chart: &ChartSpec, height: f32) {
        ui.label(RichText::new(&chart.title).size(15.0).strong());

        let categories = chart.categories.clone();
        let mut plot = Plot::new(id)
            .height(height)
            .allow_scroll(false)
            .legend(Legend::default())
            .y_axis_label(chart.y_title.clone())
            .x_axis_formatter(move |mark, _range| category_label(&categories, mark.value));

        if let Some((lo, hi)) = chart.y_range {
            plot = plot.include_y(lo).include_y(hi);
        }

        plot.show(ui, |plot_ui| {
            for series in &chart.series {
                let color = color32(series.color);

                // Segments share the series name so the legend shows one entry.
                for segment in series.segments() {
                    let points: PlotPoints = segment.into_iter().map(|(x, y)| [x, y]).collect();
                    plot_ui.line(
                        Line::new(points)
                            .color(color)
                            .width(2.0)
                            .name(&series.name),
                    );
                }

                let markers: PlotPoints = series
                    .points_xy()
                    .into_iter()
                    .map(|(x, y)| [x, y])
                    .collect();
                plot_ui.points(
                    Points::new(markers)
                        .radius(3.5)
                        .color(color)
                        .name(&series.name),
                );
            }
        });

        ui.label(
            RichText::new(format!("{}: {} series", chart.legend_title, chart.series.len()))
                .size(11.0)
                .color(Color32::GRAY),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_whole_indices_are_labelled() {
        let categories = vec!["ene-24".to_string(), "feb-24".to_string()];
        assert_eq!(category_label(&categories, 0.0), "ene-24");
        assert_eq!(category_label(&categories, 1.0000001), "feb-24");
        assert_eq!(category_label(&categories, 0.5), "");
        assert_eq!(category_label(&categories, -1.0), "");
        assert_eq!(category_label(&categories, 2.0), "");
    }

    #[test]
    fn rgb_maps_to_color32() {
        assert_eq!(color32(Rgb(255, 0, 0)), Color32::RED);
    }
}
