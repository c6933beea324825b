//! Detail Table Widget
//! Sortable, groupable and paginated grid over the filtered measurement rows.

use crate::data::Operator;
use crate::report::{DetailTable, GroupSummary, TableColumn};
use crate::stats::PeriodOrder;
use egui::{ComboBox, Grid, RichText, ScrollArea};

const PAGE_SIZE: usize = 25;

pub struct TableView {
    table: DetailTable,
    order: PeriodOrder,
    sort: Option<(TableColumn, bool)>,
    group_by: Option<TableColumn>,
    page: usize,
}

impl TableView {
    pub fn new(order: PeriodOrder) -> Self {
        Self {
            table: DetailTable::default(),
            order,
            sort: None,
            group_by: None,
            page: 0,
        }
    }

    /// Replace the rows, keeping the current sort.
    pub fn set_table(&mut self, table: DetailTable) {
        self.table = table;
        if let Some((column, descending)) = self.sort {
            self.table.sort_by(column, descending, &self.order);
        }
        self.page = self.page.min(self.page_count().saturating_sub(1));
    }

    /// Rows in display order, as exported.
    pub fn table(&self) -> &DetailTable {
        &self.table
    }

    fn page_count(&self) -> usize {
        self.table.len().div_ceil(PAGE_SIZE)
    }

    /// Clicking a header sorts ascending, clicking it again flips the direction.
    fn toggle_sort(&mut self, column: TableColumn) {
        let descending = match self.sort {
            Some((current, descending)) if current == column => !descending,
            _ => false,
        };
        self.sort = Some((column, descending));
        self.table.sort_by(column, descending, &self.order);
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!("{} rows", self.table.len()));
            ui.add_space(20.0);
            ui.label("Agrupar por:");
            let current = self.group_by.map(TableColumn::title).unwrap_or("Ninguno");
            ComboBox::from_id_salt("table_group_by")
                .selected_text(current)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.group_by, None, "Ninguno");
                    for column in TableColumn::GROUPABLE {
                        ui.selectable_value(&mut self.group_by, Some(column), column.title());
                    }
                });
        });
        ui.add_space(6.0);

        if self.table.is_empty() {
            ui.label(RichText::new("Sin filas para la selección actual.").color(egui::Color32::GRAY));
            return;
        }

        match self.group_by {
            Some(column) => {
                let groups = self.table.group_by(column, &self.order);
                Self::draw_groups(ui, column, &groups);
            }
            None => self.draw_rows(ui),
        }
    }

    fn draw_rows(&mut self, ui: &mut egui::Ui) {
        let mut clicked = None;
        let start = self.page * PAGE_SIZE;

        ScrollArea::horizontal().id_salt("detail_rows").show(ui, |ui| {
            Grid::new("detail_table")
                .striped(true)
                .min_col_width(70.0)
                .show(ui, |ui| {
                    for column in TableColumn::ALL {
                        let arrow = match self.sort {
                            Some((c, false)) if c == column => " ⬆",
                            Some((c, true)) if c == column => " ⬇",
                            _ => "",
                        };
                        let header = RichText::new(format!("{}{}", column.title(), arrow)).strong();
                        if ui.button(header).clicked() {
                            clicked = Some(column);
                        }
                    }
                    ui.end_row();

                    for row in self.table.rows.iter().skip(start).take(PAGE_SIZE) {
                        for column in TableColumn::ALL {
                            ui.label(column.text(row));
                        }
                        ui.end_row();
                    }
                });
        });

        if let Some(column) = clicked {
            self.toggle_sort(column);
        }

        let pages = self.page_count();
        if pages > 1 {
            ui.horizontal(|ui| {
                if ui.add_enabled(self.page > 0, egui::Button::new("◀")).clicked() {
                    self.page -= 1;
                }
                ui.label(format!("Page {} of {}", self.page + 1, pages));
                if ui.add_enabled(self.page + 1 < pages, egui::Button::new("▶")).clicked() {
                    self.page += 1;
                }
            });
        }
    }

    fn draw_groups(ui: &mut egui::Ui, column: TableColumn, groups: &[GroupSummary]) {
        ScrollArea::horizontal().id_salt("detail_groups").show(ui, |ui| {
            Grid::new("detail_groups_grid")
                .striped(true)
                .min_col_width(70.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(column.title()).strong());
                    ui.label(RichText::new("Filas").strong());
                    for op in Operator::ALL {
                        ui.label(RichText::new(op.thp_column()).strong());
                        ui.label(RichText::new(op.samples_column()).strong());
                    }
                    ui.end_row();

                    for group in groups {
                        ui.label(&group.key);
                        ui.label(group.rows.to_string());
                        for op in Operator::ALL {
                            ui.label(format!("{:.2}", group.throughput[op as usize]));
                            ui.label(group.samples[op as usize].to_string());
                        }
                        ui.end_row();
                    }
                });
        });
    }
}
