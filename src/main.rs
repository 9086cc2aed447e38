mod app;
mod color;
mod state;
mod ui;

use std::path::Path;

use app::ProfeScoreApp;
use eframe::egui;
use profe_score::config::{Settings, SETTINGS_FILE};
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let settings = Settings::resolve(Path::new(SETTINGS_FILE), &args);
    log::info!("Fallback data file: {}", settings.fallback_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([settings.window_width, settings.window_height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let mut state = AppState::new(settings);
    state.load_fallback();

    eframe::run_native(
        "Estadistico Docente",
        options,
        Box::new(|_cc| Ok(Box::new(ProfeScoreApp::new(state)))),
    )
}
