use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use profe_score::data::loader::DataSource;
use profe_score::data::model::Field;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filtros");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No hay datos cargados.");
        return;
    };

    // Snapshot options and selection so we can mutate state inside the loop.
    let columns: Vec<(Field, Vec<String>, Vec<String>)> = Field::FILTERABLE
        .iter()
        .map(|&field| {
            let selected = session
                .selection
                .values(field)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default();
            (field, session.options(field), selected)
        })
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (field, options, selected) in &columns {
                let header_text = if selected.is_empty() {
                    format!("Selecciona {}  (todos)", field.label())
                } else {
                    format!("Selecciona {}  ({}/{})", field.label(), selected.len(), options.len())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(field.label())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("Todos").clicked() {
                                state.select_all(*field);
                            }
                            if ui.small_button("Ninguno").clicked() {
                                state.select_none(*field);
                            }
                        });

                        for value in options {
                            let mut text = RichText::new(value);
                            if *field == Field::Program {
                                text = text.color(state.program_colors.color_for(value));
                            }
                            let mut checked = selected.contains(value);
                            if ui.checkbox(&mut checked, text).changed() {
                                state.toggle_filter_value(*field, value);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Archivo", |ui: &mut Ui| {
            if ui.button("Cargar archivo Excel o CSV…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Recargar archivo local").clicked() {
                state.load_fallback();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(dash) = &state.dashboard {
            ui.label(format!(
                "Número total de registros: {}  ·  después de eliminar valores nulos: {}  ·  \
                 después de aplicar los filtros: {}",
                dash.total_rows,
                dash.cleaned_rows,
                dash.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().weak_text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Cargar archivo Excel o CSV")
        .add_filter("Archivos soportados", &["xlsx", "xls", "csv", "json", "parquet"])
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open(DataSource::Path(path));
    }
}
