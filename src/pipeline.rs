//! Session context and the explicit pipeline run.
//!
//! A [`Session`] is opened once per source (load → validate → clean). Every
//! interaction then calls [`Session::run`], which recomputes the filtered
//! table and all views from scratch for the current selection.

use crate::data::aggregate::{build_views, ViewData, ViewKind};
use crate::data::clean::{clean, CleanReport};
use crate::data::filter::{apply, FilterSelection};
use crate::data::loader::{load, DataSource};
use crate::data::model::{EvaluationTable, Field};
use crate::data::schema::validate;
use crate::error::{ExportError, PipelineError};
use crate::export::{self, ExportCache};

/// Cache slot of the whole-filtered-table download.
const FILTERED_SLOT: &str = "filtered";

/// Everything one user session holds.
#[derive(Debug)]
pub struct Session {
    /// Name of the file the data came from.
    pub source_label: String,
    /// The validated table before cleaning.
    pub source: EvaluationTable,
    pub report: CleanReport,
    pub cleaned: EvaluationTable,
    pub selection: FilterSelection,
    export_cache: ExportCache,
}

/// The result of one pipeline run.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub total_rows: usize,
    pub cleaned_rows: usize,
    pub filtered: EvaluationTable,
    /// Empty when `filtered` is empty; otherwise all six views in order,
    /// `None` where a view has no data.
    pub views: Vec<(ViewKind, Option<ViewData>)>,
}

impl Dashboard {
    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }
}

impl Session {
    /// Load, validate and clean a source. Any failure here is fatal for the run.
    pub fn open(source: &DataSource) -> Result<Session, PipelineError> {
        let raw = load(source)?;
        let table = validate(&raw)?;
        Ok(Session::from_table(source.display_name(), table))
    }

    /// Start a session from an already validated table.
    pub fn from_table(source_label: String, source: EvaluationTable) -> Session {
        let (cleaned, report) = clean(&source);
        Session {
            source_label,
            source,
            report,
            cleaned,
            selection: FilterSelection::default(),
            export_cache: ExportCache::new(),
        }
    }

    /// Rows in the source, before cleaning.
    pub fn total_rows(&self) -> usize {
        self.source.len()
    }

    /// Values offered by a filter widget.
    pub fn options(&self, field: Field) -> Vec<String> {
        self.cleaned.unique_values(field).into_iter().collect()
    }

    /// Recompute the filtered table and the views for the current selection.
    pub fn run(&self) -> Dashboard {
        run(&self.cleaned, &self.selection, self.report)
    }

    /// The memoized download of the whole filtered table.
    pub fn export_filtered(&mut self, dashboard: &Dashboard) -> Result<Vec<u8>, ExportError> {
        let table = dashboard.filtered.to_table();
        self.export_cache
            .get_or_build(FILTERED_SLOT, &table, export::FILTERED_SHEET)
            .map(<[u8]>::to_vec)
    }

    /// Serialize a view's table on demand.
    pub fn export_view(&self, view: &ViewData) -> Result<Vec<u8>, ExportError> {
        export::to_xlsx(&view.table, export::VIEW_SHEET)
    }

    pub fn export_builds(&self) -> usize {
        self.export_cache.builds()
    }
}

/// The pipeline below the cleaner, as a pure function of its inputs.
pub fn run(
    cleaned: &EvaluationTable,
    selection: &FilterSelection,
    report: CleanReport,
) -> Dashboard {
    let filtered = apply(cleaned, selection);
    let views = if filtered.is_empty() {
        log::warn!("No rows match the current filters");
        Vec::new()
    } else {
        build_views(&filtered)
    };
    Dashboard {
        total_rows: report.before,
        cleaned_rows: report.after,
        filtered,
        views,
    }
}
