//! End-to-end pipeline tests: files on disk → session → dashboard → exports.
//!
//! Fixtures are written with the crate's own exporter (xlsx) or as raw
//! ISO-8859-1 bytes (csv) into a temporary directory.

use std::path::{Path, PathBuf};

use profe_score::data::aggregate::{Chart, ViewKind};
use profe_score::data::loader::DataSource;
use profe_score::data::model::{CellValue, Field, Table};
use profe_score::error::{LoadError, PipelineError, SchemaError};
use profe_score::export::{read_xlsx, to_xlsx, VIEW_SHEET};
use profe_score::pipeline::Session;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

/// One template row. `director` is a raw cell so tests can inject junk.
fn row(
    name: &str,
    program: &str,
    subject: &str,
    period: &str,
    director: CellValue,
    final_score: f64,
) -> Vec<CellValue> {
    vec![
        text(name),
        text(program),
        text(subject),
        CellValue::Integer(101),
        text("A"),
        CellValue::Float(4.0),
        director,
        CellValue::Float(4.2),
        CellValue::Float(final_score),
        text(period),
    ]
}

fn template(rows: Vec<Vec<CellValue>>) -> Table {
    Table {
        columns: Field::ALL.iter().map(|f| f.label().to_string()).collect(),
        rows,
    }
}

fn write_xlsx(dir: &Path, name: &str, table: &Table) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, to_xlsx(table, VIEW_SHEET).unwrap()).unwrap();
    path
}

/// Three programs, one record per (program × subject); "Math" scores 3, 4, 5.
/// Plus one record whose director score is not a number.
fn sample() -> Table {
    template(vec![
        row("Ana", "Engineering", "Math", "2023-1", CellValue::Float(4.0), 3.0),
        row("Luis", "Arts", "Math", "2023-2", CellValue::Float(3.5), 4.0),
        row("Eva", "Law", "Math", "2023-1", CellValue::Float(4.5), 5.0),
        row("Ana", "Engineering", "Physics", "2024-1", CellValue::Float(4.1), 4.5),
        row("Luis", "Arts", "History", "2023-2", CellValue::Float(3.9), 3.5),
        row("Eva", "Law", "Ethics", "2024-1", CellValue::Float(4.4), 4.8),
        row("Ghost", "Engineering", "Math", "2023-1", text("N/A"), 1.0),
    ])
}

fn open_sample() -> (tempfile::TempDir, Session) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_xlsx(dir.path(), "plantilla.xlsx", &sample());
    let session = Session::open(&DataSource::Path(path)).unwrap();
    (dir, session)
}

// ---------------------------------------------------------------------------
// Load, validate, clean
// ---------------------------------------------------------------------------

#[test]
fn xlsx_source_is_loaded_and_cleaned() {
    let (_dir, session) = open_sample();
    assert_eq!(session.total_rows(), 7);
    assert_eq!(session.source.len(), 7);
    assert_eq!(session.report.before, 7);
    assert_eq!(session.report.after, 6);
    assert!(session.source_label.ends_with("plantilla.xlsx"));

    let dash = session.run();
    assert_eq!(dash.total_rows, 7);
    assert_eq!(dash.cleaned_rows, 6);
    assert_eq!(dash.filtered.len(), 6);
    assert_eq!(dash.views.len(), 6);
}

#[test]
fn non_numeric_director_score_disappears_everywhere() {
    let (_dir, session) = open_sample();
    let dash = session.run();

    assert!(dash.filtered.records.iter().all(|r| r.name.as_deref() != Some("Ghost")));
    for (_, view) in &dash.views {
        let view = view.as_ref().unwrap();
        let name_col = view.table.columns.iter().position(|c| c == "Nombre");
        if let Some(col) = name_col {
            assert!(view.table.rows.iter().all(|r| r[col] != text("Ghost")));
        }
    }

    // "Ghost" scored 1.0 in Math; the Math mean would drop if it leaked in.
    let (_, subject_view) = &dash.views[3];
    let Chart::Bars(means) = &subject_view.as_ref().unwrap().chart else {
        panic!("expected bars");
    };
    let math = means.iter().find(|g| g.key == "Math").unwrap();
    assert_eq!(math.mean, 4.0);
}

#[test]
fn missing_columns_halt_with_their_names() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = sample();
    for r in &mut table.rows {
        r.truncate(8);
    }
    table.columns.truncate(8);
    let path = write_xlsx(dir.path(), "incompleta.xlsx", &table);

    match Session::open(&DataSource::Path(path)) {
        Err(PipelineError::Schema(SchemaError::MissingColumns { missing })) => {
            assert_eq!(missing, vec!["Definitiva".to_string(), "Periodo".to_string()]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn absent_fallback_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plantilla.xlsx");
    let err = Session::open(&DataSource::Path(path.clone())).unwrap_err();
    assert!(matches!(err, PipelineError::Load(LoadError::NotFound { .. })));
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn latin1_csv_upload_keeps_accents() {
    let mut csv = String::from(
        "Nombre,Programa,Materia,Codigo,Grupo,Nota_Estudiante,Nota_Director,\
         Autoevaluacion,Definitiva,Periodo\n",
    );
    csv.push_str("José Muñoz,Ingeniería,Cálculo,101,A,4.0,4.2,4.5,4.1,2023-1\n");
    csv.push_str("Ana Gómez,Psicología,Estadística,102,B,3.0,,4.0,3.6,2023-2\n");
    let bytes: Vec<u8> = csv.chars().map(|c| c as u32 as u8).collect();

    let session = Session::open(&DataSource::Upload {
        file_name: "evaluaciones.csv".into(),
        bytes,
    })
    .unwrap();

    assert_eq!(session.report.before, 2);
    assert_eq!(session.report.after, 1);
    assert_eq!(session.options(Field::Program), vec!["Ingeniería".to_string()]);
    assert_eq!(session.cleaned.records[0].name.as_deref(), Some("José Muñoz"));
}

#[test]
fn infinite_final_score_is_dropped_by_the_cleaner() {
    let mut csv = String::from(
        "Nombre,Programa,Materia,Codigo,Grupo,Nota_Estudiante,Nota_Director,\
         Autoevaluacion,Definitiva,Periodo\n",
    );
    csv.push_str("Ana,Arts,Math,101,A,4.0,4.0,4.0,inf,2023-1\n");
    csv.push_str("Luis,Law,Math,102,A,4.0,4.0,4.0,4.0,2023-1\n");

    let session = Session::open(&DataSource::Upload {
        file_name: "notas.csv".into(),
        bytes: csv.into_bytes(),
    })
    .unwrap();
    assert_eq!(session.report.after, 1);

    let dash = session.run();
    let (_, view) = &dash.views[1];
    let Chart::Distribution(groups) = &view.as_ref().unwrap().chart else {
        panic!("expected distribution");
    };
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "Law");
    assert!(groups[0].points.iter().all(|p| p.x == 0.0));
}

// ---------------------------------------------------------------------------
// Filter and views
// ---------------------------------------------------------------------------

#[test]
fn program_filter_counts_only_that_program() {
    let (_dir, mut session) = open_sample();
    session.selection.toggle(Field::Program, "Engineering");
    let dash = session.run();
    let expected = session
        .cleaned
        .records
        .iter()
        .filter(|r| r.program.as_deref() == Some("Engineering"))
        .count();
    assert_eq!(dash.filtered.len(), expected);
    assert_eq!(expected, 2);
}

#[test]
fn empty_filter_result_skips_every_view() {
    let (_dir, mut session) = open_sample();
    session.selection.toggle(Field::Program, "Arts");
    session.selection.toggle(Field::Subject, "Ethics");
    let dash = session.run();
    assert!(dash.is_empty());
    assert_eq!(dash.filtered.len(), 0);
    assert!(dash.views.is_empty());
    assert_eq!(dash.cleaned_rows, 6);
}

#[test]
fn views_come_in_dashboard_order() {
    let (_dir, session) = open_sample();
    let kinds: Vec<ViewKind> = session.run().views.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, ViewKind::ALL.to_vec());
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[test]
fn every_view_export_round_trips() {
    let (_dir, session) = open_sample();
    let dash = session.run();
    for (_, view) in &dash.views {
        let view = view.as_ref().unwrap();
        let bytes = session.export_view(view).unwrap();
        let back = read_xlsx(&bytes).unwrap();
        assert_eq!(back.columns, view.table.columns);
        assert_eq!(back.len(), view.table.len());
    }
}

#[test]
fn filtered_export_is_memoized_per_content() {
    let (_dir, mut session) = open_sample();
    let dash = session.run();
    let first = session.export_filtered(&dash).unwrap();
    let again = session.export_filtered(&session.run()).unwrap();
    assert_eq!(first, again);
    assert_eq!(session.export_builds(), 1);

    let back = read_xlsx(&first).unwrap();
    assert_eq!(back.len(), 6);
    assert_eq!(back.columns.len(), 10);

    session.selection.toggle(Field::Period, "2023-1");
    let narrowed = session.run();
    let bytes = session.export_filtered(&narrowed).unwrap();
    assert_eq!(session.export_builds(), 2);
    assert_eq!(read_xlsx(&bytes).unwrap().len(), narrowed.filtered.len());
}

#[test]
fn filtered_export_keeps_source_column_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = sample();
    table.columns.rotate_left(3);
    table.columns.insert(2, "Sede".into());
    for r in &mut table.rows {
        r.rotate_left(3);
        r.insert(2, text("Cali"));
    }
    let path = write_xlsx(dir.path(), "reordenada.xlsx", &table);

    let mut session = Session::open(&DataSource::Path(path)).unwrap();
    let dash = session.run();
    let back = read_xlsx(&session.export_filtered(&dash).unwrap()).unwrap();
    assert_eq!(back.columns, table.columns);
    assert_eq!(back.rows[0][2], text("Cali"));
    assert_eq!(back.rows[0][8], text("Ana"));
}
