//! Chart Viewer Widget
//! Central scrollable panel: metric cards, trend charts and the detail table.

use crate::charts::ChartPlotter;
use crate::gui::TableView;
use crate::report::{MetricCard, Report};
use egui::{Color32, RichText, ScrollArea};

const CHART_HEIGHT: f32 = 320.0;
const CARD_SPACING: f32 = 12.0;

pub struct ChartViewer;

impl ChartViewer {
    /// A load or processing failure replaces the whole view.
    pub fn show_error(ui: &mut egui::Ui, message: &str) {
        ui.centered_and_justified(|ui| {
            ui.label(
                RichText::new(format!("⚠ Error al cargar o procesar los datos: {message}"))
                    .size(16.0)
                    .color(Color32::from_rgb(220, 53, 69)),
            );
        });
    }

    pub fn show(ui: &mut egui::Ui, report: &Report, table: &mut TableView) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::section_title(ui, "GRAFICOS THROUGHPUT");

                match &report.overview {
                    Some(overview) => {
                        if overview.metrics.is_empty() {
                            Self::warning(ui, "No hay datos para el período seleccionado.");
                        } else {
                            Self::draw_metrics(ui, &overview.metrics);
                        }
                        ui.add_space(CARD_SPACING);
                        Self::card(ui, |ui| {
                            ChartPlotter::draw_line_chart(
                                ui,
                                "thp_operador",
                                &overview.operator_trend,
                                CHART_HEIGHT,
                            );
                        });
                    }
                    None => {
                        Self::warning(ui, "No hay datos disponibles para los períodos seleccionados.");
                    }
                }

                if let Some(chart) = &report.comparison {
                    ui.add_space(CARD_SPACING);
                    Self::card(ui, |ui| {
                        ChartPlotter::draw_line_chart(ui, "thp_operador_provincia", chart, CHART_HEIGHT);
                    });
                }

                ui.add_space(CARD_SPACING);
                Self::section_title(ui, &format!("THP {}", report.selection.focus.name()));

                ui.columns(2, |cols| {
                    Self::card(&mut cols[0], |ui| match &report.province_trend {
                        Some(chart) => {
                            ChartPlotter::draw_line_chart(ui, "thp_provincia", chart, CHART_HEIGHT)
                        }
                        None => {
                            ui.label("Sin datos para la provincia seleccionada.");
                        }
                    });
                    Self::card(&mut cols[1], |ui| match &report.locality_trend {
                        Some(chart) => {
                            ChartPlotter::draw_line_chart(ui, "thp_localidad", chart, CHART_HEIGHT)
                        }
                        None => {
                            ui.label("Seleccione localidades para ver su evolución.");
                        }
                    });
                });

                ui.add_space(CARD_SPACING);
                Self::section_title(ui, "TABLERO");
                Self::card(ui, |ui| table.show(ui));
            });
    }

    fn section_title(ui: &mut egui::Ui, title: &str) {
        ui.add_space(6.0);
        ui.label(RichText::new(title).size(20.0).strong());
        ui.separator();
    }

    fn warning(ui: &mut egui::Ui, text: &str) {
        ui.label(
            RichText::new(format!("⚠ {text}"))
                .size(14.0)
                .color(Color32::from_rgb(243, 156, 18)),
        );
    }

    fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                add_contents(ui);
            });
    }

    fn draw_metrics(ui: &mut egui::Ui, metrics: &[MetricCard]) {
        ui.columns(metrics.len(), |cols| {
            for (ui, metric) in cols.iter_mut().zip(metrics) {
                Self::card(ui, |ui| {
                    ui.label(RichText::new(metric.title()).size(13.0).color(Color32::GRAY));
                    ui.label(RichText::new(metric.value_label()).size(24.0).strong());
                    if let Some(delta) = metric.delta_label() {
                        let color = if delta.starts_with('-') {
                            Color32::from_rgb(220, 53, 69)
                        } else {
                            Color32::from_rgb(40, 167, 69)
                        };
                        ui.label(RichText::new(delta).size(13.0).color(color));
                    }
                });
            }
        });
    }
}
