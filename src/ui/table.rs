use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};
use profe_score::data::model::EvaluationTable;

const ROW_HEIGHT: f32 = 18.0;

/// Scrollable grid of the filtered records, every column of the source.
pub fn filtered_table(ui: &mut Ui, filtered: &EvaluationTable) {
    let table = filtered.to_table();

    TableBuilder::new(ui)
        .id_salt("filtered_table")
        .striped(true)
        .resizable(true)
        .max_scroll_height(400.0)
        .columns(Column::auto().at_least(60.0), table.columns.len())
        .header(ROW_HEIGHT + 4.0, |mut header| {
            for name in &table.columns {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, table.rows.len(), |mut row| {
                let cells = &table.rows[row.index()];
                for cell in cells {
                    row.col(|ui| {
                        ui.label(cell.to_string());
                    });
                }
            });
        });
}
