use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use profe_score::config::Settings;
use profe_score::data::loader::DataSource;
use profe_score::data::model::Field;
use profe_score::error::ExportError;
use profe_score::pipeline::{Dashboard, Session};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Loaded, validated and cleaned data (None until a load succeeds).
    pub session: Option<Session>,

    /// Output of the last pipeline run for the current selection.
    pub dashboard: Option<Dashboard>,

    /// Load or schema error. While set, nothing below it is rendered.
    pub fatal: Option<String>,

    /// Informational line shown in the top bar.
    pub status_message: Option<String>,

    /// Colours per program, shared by every chart.
    pub program_colors: ColorMap,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            session: None,
            dashboard: None,
            fatal: None,
            status_message: None,
            program_colors: ColorMap::default(),
        }
    }

    /// Load the configured local file (used when nothing was uploaded).
    pub fn load_fallback(&mut self) {
        let path = self.settings.fallback_path.clone();
        if self.open(DataSource::Path(path.clone())) {
            self.status_message = Some(format!("Usando el archivo local: {}", path.display()));
        }
    }

    /// Replace the session with a freshly loaded source. Returns whether the
    /// load succeeded.
    pub fn open(&mut self, source: DataSource) -> bool {
        match Session::open(&source) {
            Ok(session) => {
                log::info!(
                    "Session opened from {}: {} rows, {} after cleaning",
                    session.source_label,
                    session.total_rows(),
                    session.report.after
                );
                self.program_colors = ColorMap::new(&session.cleaned.unique_values(Field::Program));
                self.session = Some(session);
                self.fatal = None;
                self.status_message = None;
                self.rerun();
                true
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", source.display_name());
                self.session = None;
                self.dashboard = None;
                self.fatal = Some(format!("Error: {e}"));
                false
            }
        }
    }

    /// Recompute the dashboard after a filter change.
    pub fn rerun(&mut self) {
        self.dashboard = self.session.as_ref().map(Session::run);
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, field: Field, value: &str) {
        if let Some(session) = &mut self.session {
            session.selection.toggle(field, value);
        }
        self.rerun();
    }

    /// Select every value of a column.
    pub fn select_all(&mut self, field: Field) {
        if let Some(session) = &mut self.session {
            let all: BTreeSet<String> = session.options(field).into_iter().collect();
            session.selection.set(field, all);
        }
        self.rerun();
    }

    /// Remove every restriction on a column.
    pub fn select_none(&mut self, field: Field) {
        if let Some(session) = &mut self.session {
            session.selection.clear(field);
        }
        self.rerun();
    }

    /// Ask where to save a download and write it there.
    pub fn save_download(&mut self, file_name: &str, buffer: Result<Vec<u8>, ExportError>) {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Guardar datos")
            .set_file_name(file_name)
            .add_filter("Excel", &["xlsx"])
            .save_file()
        else {
            return;
        };

        match write_download(&path, buffer) {
            Ok(()) => {
                log::info!("Saved {}", path.display());
                self.status_message = Some(format!("Guardado: {}", path.display()));
            }
            Err(e) => {
                log::error!("Download failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn write_download(path: &Path, buffer: Result<Vec<u8>, ExportError>) -> Result<()> {
    let bytes = buffer.context("building spreadsheet")?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
