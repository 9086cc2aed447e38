use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ProfeScoreApp {
    pub state: AppState,
}

impl ProfeScoreApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ProfeScoreApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title and menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(
                    egui::RichText::new("Estadistico Docente")
                        .color(egui::Color32::from_rgb(20, 142, 64))
                        .strong(),
                );
            });
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        if self.state.fatal.is_none() {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: charts and data ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    plot::dashboard(ui, &mut self.state);
                });
        });
    }
}
