//! THP Dashboard Main Application
//! Main window with control panel and report viewer.
//!
//! Every frame draws the last computed [`Report`]; a new one is computed only
//! when the selection or the data source changes.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::DataCache;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, TableView};
use crate::report::{export_csv_to_path, Report, ReportEngine, EXPORT_FILE_NAME};
use egui::SidePanel;
use tracing::{debug, error, info, warn};

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    cache: DataCache,
    engine: ReportEngine,
    control_panel: ControlPanel,
    table_view: TableView,
    report: Result<Report, String>,
    dirty: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let order = config.period_order();
        Self {
            control_panel: ControlPanel::new(config.data_path.clone(), config.focus_operator),
            table_view: TableView::new(order.clone()),
            engine: ReportEngine::new(order),
            cache: DataCache::new(),
            report: Err("No data loaded".to_string()),
            dirty: true,
            config,
        }
    }

    /// Recompute the report from the cached table and the current selection.
    fn refresh(&mut self) {
        self.dirty = false;
        let path = self.control_panel.csv_path.clone();

        match self.engine.run(&mut self.cache, &path, &self.control_panel.selection) {
            Ok(report) => {
                debug!(cached_files = self.cache.len(), "Report ready");
                self.control_panel.sync(Some(&report));
                self.table_view.set_table(report.table.clone());
                self.control_panel
                    .set_status(format!("Loaded {} ({} rows)", path.display(), report.table.len()));
                self.report = Ok(report);
            }
            Err(e) => {
                error!(path = %path.display(), "{e}");
                self.control_panel.sync(None);
                self.control_panel.set_status(format!("Error: {e}"));
                self.report = Err(e.to_string());
            }
        }
    }

    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            info!(path = %path.display(), "Selected data file");
            self.control_panel.csv_path = path;
            self.dirty = true;
        }
    }

    fn handle_reload(&mut self) {
        self.cache.invalidate(&self.control_panel.csv_path);
        self.dirty = true;
    }

    fn handle_export_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(EXPORT_FILE_NAME)
            .save_file()
        else {
            return;
        };

        match export_csv_to_path(&self.table_view.table().rows, &path) {
            Ok(()) => {
                self.control_panel
                    .set_status(format!("Exported {}", path.display()));
                if self.control_panel.open_after_export {
                    if let Err(e) = open::that(&path) {
                        warn!(path = %path.display(), "Could not open export: {e}");
                    }
                }
            }
            Err(e) => {
                error!("CSV export failed: {e}");
                self.control_panel.set_status(format!("Error: {e}"));
            }
        }
    }

    fn handle_export_charts(&mut self) {
        let Ok(report) = &self.report else {
            return;
        };
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let result = StaticChartRenderer::export_report(
            report,
            &dir,
            self.config.chart_width,
            self.config.chart_height,
        );
        match result {
            Ok(paths) => self.control_panel.set_status(format!(
                "Exported {} charts to {}",
                paths.len(),
                dir.display()
            )),
            Err(e) => {
                error!("Chart export failed: {e}");
                self.control_panel.set_status(format!("Error: {e}"));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.dirty {
            self.refresh();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(360.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::SelectionChanged => self.dirty = true,
                        ControlPanelAction::ExportCsv => self.handle_export_csv(),
                        ControlPanelAction::ExportCharts => self.handle_export_charts(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| match &self.report {
            Ok(report) => ChartViewer::show(ui, report, &mut self.table_view),
            Err(message) => ChartViewer::show_error(ui, message),
        });

        if self.dirty {
            ctx.request_repaint();
        }
    }
}
