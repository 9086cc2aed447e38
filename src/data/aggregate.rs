use std::collections::BTreeMap;

use super::model::{CellValue, EvaluationTable, Field, Record, Table};
use super::stats::{mean, BoxStats};

/// Number of teachers in the ranking view.
pub const TOP_N: usize = 5;

// ---------------------------------------------------------------------------
// The six fixed views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViewKind {
    SelfVsDirector,
    ScoresByProgram,
    TopTeachers,
    AverageBySubject,
    AverageByPeriod,
    Outliers,
}

impl ViewKind {
    /// Display order on the dashboard.
    pub const ALL: [ViewKind; 6] = [
        ViewKind::SelfVsDirector,
        ViewKind::ScoresByProgram,
        ViewKind::TopTeachers,
        ViewKind::AverageBySubject,
        ViewKind::AverageByPeriod,
        ViewKind::Outliers,
    ];

    /// Stable label, used as the stem of the download file name.
    pub fn label(self) -> &'static str {
        match self {
            ViewKind::SelfVsDirector => "Autoevaluacion_vs_Nota_Director",
            ViewKind::ScoresByProgram => "Distribucion_Notas_Programa",
            ViewKind::TopTeachers => "Top5_Profesores_Nota_Definitiva",
            ViewKind::AverageBySubject => "Promedio_Notas_Materia",
            ViewKind::AverageByPeriod => "Evolucion_Notas_Periodo",
            ViewKind::Outliers => "Outliers_Evaluaciones",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::SelfVsDirector => "Comparación entre Autoevaluación y Nota Director",
            ViewKind::ScoresByProgram => "Distribución de Notas por Programa",
            ViewKind::TopTeachers => "Top 5 Profesores por Nota Definitiva",
            ViewKind::AverageBySubject => "Promedio de Notas por Materia",
            ViewKind::AverageByPeriod => "Evolución de Notas por Periodo",
            ViewKind::Outliers => "Análisis de Outliers en Evaluaciones",
        }
    }

    /// The two fields that must both be present in at least one record for
    /// the view to be drawn.
    pub fn required(self) -> [Field; 2] {
        match self {
            ViewKind::SelfVsDirector => [Field::SelfEvaluation, Field::DirectorScore],
            ViewKind::ScoresByProgram => [Field::Program, Field::FinalScore],
            ViewKind::TopTeachers => [Field::Name, Field::FinalScore],
            ViewKind::AverageBySubject => [Field::Subject, Field::FinalScore],
            ViewKind::AverageByPeriod => [Field::Period, Field::FinalScore],
            ViewKind::Outliers => [Field::Subject, Field::FinalScore],
        }
    }

    /// Fields shown when hovering a single-record point.
    fn hover_fields(self) -> &'static [Field] {
        match self {
            ViewKind::SelfVsDirector => {
                &[Field::Name, Field::Program, Field::Subject, Field::Period]
            }
            ViewKind::ScoresByProgram => &[Field::Name, Field::Subject, Field::Period],
            ViewKind::Outliers => &[Field::Name, Field::Program, Field::Period],
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Chart payloads
// ---------------------------------------------------------------------------

/// One record drawn as a point, with the metadata shown on hover.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub hover: String,
}

/// Mean FinalScore of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: String,
    pub mean: f64,
    pub count: usize,
}

/// Per-program distribution: summary plus every individual point.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub key: String,
    pub stats: BoxStats,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    /// x = SelfEvaluation, y = DirectorScore.
    Scatter(Vec<Point>),
    /// Groups are positioned at x = 0, 1, 2, ...
    Distribution(Vec<Distribution>),
    /// Horizontal bars, best first.
    Ranking(Vec<GroupMean>),
    Bars(Vec<GroupMean>),
    Line(Vec<GroupMean>),
    /// x = FinalScore, y = index into `categories`.
    Strip {
        categories: Vec<String>,
        points: Vec<Point>,
    },
}

/// A computed view: what to draw and the table offered for download.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewData {
    pub kind: ViewKind,
    pub chart: Chart,
    pub table: Table,
}

// ---------------------------------------------------------------------------
// Aggregation helpers
// ---------------------------------------------------------------------------

/// Whether any record has both fields present.
pub fn has_pairs(table: &EvaluationTable, fields: [Field; 2]) -> bool {
    table.records.iter().any(|r| r.has(fields[0]) && r.has(fields[1]))
}

/// Mean FinalScore per label of `key`, in lexicographic key order. Records
/// without a key or a score are skipped.
pub fn group_means(table: &EvaluationTable, key: Field) -> Vec<GroupMean> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in &table.records {
        if let (Some(k), Some(v)) = (r.label(key), r.final_score) {
            groups.entry(k).or_default().push(v);
        }
    }
    groups
        .into_iter()
        .filter_map(|(k, values)| {
            Some(GroupMean {
                key: k.to_string(),
                mean: mean(&values)?,
                count: values.len(),
            })
        })
        .collect()
}

/// Highest `n` means, descending. The sort is stable, so equal means keep
/// the lexicographic order of their keys.
pub fn top_n(mut means: Vec<GroupMean>, n: usize) -> Vec<GroupMean> {
    means.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    means.truncate(n);
    means
}

fn means_table(key: Field, means: &[GroupMean]) -> Table {
    Table {
        columns: vec![key.label().to_string(), Field::FinalScore.label().to_string()],
        rows: means
            .iter()
            .map(|g| vec![CellValue::Text(g.key.clone()), CellValue::Float(g.mean)])
            .collect(),
    }
}

fn hover_text(record: &Record, fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.label(), record.label(*f).unwrap_or("-")))
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// View builders
// ---------------------------------------------------------------------------

/// Compute one view from the filtered table; `None` when its required fields
/// have no complete pair.
pub fn build_view(kind: ViewKind, table: &EvaluationTable) -> Option<ViewData> {
    if !has_pairs(table, kind.required()) {
        log::warn!("Not enough data for view {}", kind.label());
        return None;
    }

    let (chart, export) = match kind {
        ViewKind::SelfVsDirector => {
            let points = table
                .records
                .iter()
                .filter_map(|r| {
                    Some(Point {
                        x: r.self_evaluation?,
                        y: r.director_score?,
                        hover: hover_text(r, kind.hover_fields()),
                    })
                })
                .collect();
            let export = table.project(&[
                Field::SelfEvaluation,
                Field::DirectorScore,
                Field::Name,
                Field::Program,
                Field::Subject,
                Field::Period,
            ]);
            (Chart::Scatter(points), export)
        }
        ViewKind::ScoresByProgram => {
            let mut groups: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
            for r in &table.records {
                if let (Some(p), Some(_)) = (r.program.as_deref(), r.final_score) {
                    groups.entry(p).or_default().push(r);
                }
            }
            // Drop groups without a box first so positions stay contiguous.
            let distributions = groups
                .into_iter()
                .filter_map(|(key, records)| {
                    let values: Vec<f64> = records.iter().filter_map(|r| r.final_score).collect();
                    Some((key, records, BoxStats::from_values(&values)?))
                })
                .enumerate()
                .map(|(i, (key, records, stats))| Distribution {
                    key: key.to_string(),
                    stats,
                    points: records
                        .iter()
                        .filter_map(|r| {
                            Some(Point {
                                x: i as f64,
                                y: r.final_score?,
                                hover: hover_text(r, kind.hover_fields()),
                            })
                        })
                        .collect(),
                })
                .collect();
            let export = table.project(&[
                Field::Program,
                Field::FinalScore,
                Field::Name,
                Field::Subject,
                Field::Period,
            ]);
            (Chart::Distribution(distributions), export)
        }
        ViewKind::TopTeachers => {
            let top = top_n(group_means(table, Field::Name), TOP_N);
            let export = means_table(Field::Name, &top);
            (Chart::Ranking(top), export)
        }
        ViewKind::AverageBySubject => {
            let means = group_means(table, Field::Subject);
            let export = means_table(Field::Subject, &means);
            (Chart::Bars(means), export)
        }
        ViewKind::AverageByPeriod => {
            let means = group_means(table, Field::Period);
            let export = means_table(Field::Period, &means);
            (Chart::Line(means), export)
        }
        ViewKind::Outliers => {
            let categories: Vec<String> =
                table.unique_values(Field::Subject).into_iter().collect();
            let points = table
                .records
                .iter()
                .filter_map(|r| {
                    let subject = r.subject.as_deref()?;
                    let y = categories.iter().position(|c| c == subject)?;
                    Some(Point {
                        x: r.final_score?,
                        y: y as f64,
                        hover: hover_text(r, kind.hover_fields()),
                    })
                })
                .collect();
            let export = table.project(&[
                Field::FinalScore,
                Field::Subject,
                Field::Name,
                Field::Program,
                Field::Period,
            ]);
            (Chart::Strip { categories, points }, export)
        }
    };

    Some(ViewData {
        kind,
        chart,
        table: export,
    })
}

/// All six views in dashboard order. Each is short-circuited independently.
pub fn build_views(table: &EvaluationTable) -> Vec<(ViewKind, Option<ViewData>)> {
    ViewKind::ALL
        .iter()
        .map(|&kind| (kind, build_view(kind, table)))
        .collect()
}
