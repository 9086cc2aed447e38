//! Error types for each stage of the pipeline.
//!
//! Load and schema errors are fatal for a run: the dashboard shows the message
//! and renders nothing below it. Empty results are not errors; they surface as
//! `None` views or an empty filtered table.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a table from a file or upload.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unsupported file extension: .{extension}")]
    Unsupported { extension: String },

    #[error("failed to read {source_name}: {message}")]
    Read { source_name: String, message: String },
}

impl LoadError {
    pub(crate) fn read(source_name: &str, err: impl std::fmt::Display) -> Self {
        LoadError::Read {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }
}

/// The loaded table does not match the evaluation template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

/// Failure to serialize a table to a spreadsheet buffer.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("xlsx read failed: {0}")]
    Read(String),
}

/// Anything that halts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
