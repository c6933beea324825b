//! Control Panel Widget
//! Left side panel with the data source, the report filters and the export buttons.

use crate::data::Operator;
use crate::report::{Report, Selection};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::path::PathBuf;

/// Left side control panel.
pub struct ControlPanel {
    pub csv_path: PathBuf,
    pub selection: Selection,
    pub periods: Vec<String>,
    pub provinces: Vec<String>,
    pub localities: Vec<String>,
    pub open_after_export: bool,
    pub status: String,
    has_report: bool,
}

impl ControlPanel {
    pub fn new(csv_path: PathBuf, focus: Operator) -> Self {
        Self {
            csv_path,
            selection: Selection {
                focus,
                ..Selection::default()
            },
            periods: Vec::new(),
            provinces: Vec::new(),
            localities: Vec::new(),
            open_after_export: false,
            status: "Ready".to_string(),
            has_report: false,
        }
    }

    /// Take the options and the resolved selection of a fresh report.
    pub fn sync(&mut self, report: Option<&Report>) {
        match report {
            Some(report) => {
                self.periods = report.periods.clone();
                self.provinces = report.provinces.clone();
                self.localities = report.localities.clone();
                self.selection = report.selection.clone();
                self.has_report = true;
            }
            None => {
                self.provinces.clear();
                self.localities.clear();
                self.has_report = false;
            }
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let before = self.selection.clone();

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📶 THP Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Throughput por operador")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let name = self
                        .csv_path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());
                    ui.label(RichText::new(name).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🔄").on_hover_text("Reload file").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filters =====
        ui.label(RichText::new("🔧 Filters").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 90.0;
        let combo_width = 170.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Periodo:"));
            ComboBox::from_id_salt("period")
                .width(combo_width)
                .selected_text(&self.selection.period)
                .show_ui(ui, |ui| {
                    for period in &self.periods {
                        ui.selectable_value(&mut self.selection.period, period.clone(), period);
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Provincia:"));
            let current = self.selection.province.clone().unwrap_or_default();
            ComboBox::from_id_salt("province")
                .width(combo_width)
                .selected_text(current)
                .show_ui(ui, |ui| {
                    for province in &self.provinces {
                        let selected = self.selection.province.as_ref() == Some(province);
                        if ui.selectable_label(selected, province).clicked() && !selected {
                            self.selection.province = Some(province.clone());
                            self.selection.localities.clear();
                        }
                    }
                });
        });

        ui.add_space(5.0);

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Operador:"));
            for op in Operator::ALL {
                ui.radio_value(&mut self.selection.focus, op, op.name());
            }
        });

        ui.add_space(10.0);

        ui.label("Localidades:");
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(180.0).show(ui, |ui| {
                    if self.localities.is_empty() {
                        ui.label(RichText::new("No localities").color(Color32::GRAY));
                    }
                    for locality in &self.localities {
                        let mut checked = self.selection.localities.contains(locality);
                        if ui.checkbox(&mut checked, locality).changed() {
                            if checked {
                                self.selection.localities.insert(locality.clone());
                            } else {
                                self.selection.localities.remove(locality);
                            }
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Select All").clicked() {
                self.selection.localities = self.localities.iter().cloned().collect();
            }
            if ui.small_button("Clear All").clicked() {
                self.selection.localities.clear();
            }
        });

        if self.selection != before {
            action = ControlPanelAction::SelectionChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.label(RichText::new("💾 Export").size(14.0).strong());
        ui.add_space(5.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.has_report, |ui| {
                let csv_button = egui::Button::new(RichText::new("📄 Export CSV").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(csv_button).clicked() {
                    action = ControlPanelAction::ExportCsv;
                }

                ui.add_space(6.0);

                let png_button = egui::Button::new(RichText::new("🖼 Export Charts").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportCharts;
                }
            });
            ui.checkbox(&mut self.open_after_export, "Open CSV after export");
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    Reload,
    SelectionChanged,
    ExportCsv,
    ExportCharts,
}
