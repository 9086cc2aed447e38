use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, Points,
};
use profe_score::data::aggregate::{Chart, GroupMean, Point, ViewData, ViewKind};
use profe_score::export::file_name_for;

use crate::color::ColorMap;
use crate::state::AppState;
use crate::ui::{table, Download};

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Central panel: the six charts and the filtered table
// ---------------------------------------------------------------------------

/// Render every dashboard section for the current pipeline run.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if let Some(err) = &state.fatal {
        ui.label(RichText::new(err).color(Color32::RED).strong());
        return;
    }
    let Some(dash) = &state.dashboard else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Carga un archivo para ver las estadísticas  (Archivo → Cargar…)");
        });
        return;
    };

    if dash.is_empty() {
        ui.label(
            RichText::new("No hay datos para mostrar con los filtros seleccionados.")
                .color(Color32::from_rgb(200, 140, 0)),
        );
        return;
    }

    let mut pending: Option<Download> = None;

    ui.heading("Visualizaciones");
    for (kind, view) in &dash.views {
        ui.add_space(8.0);
        ui.strong(kind.title());
        match view {
            None => {
                ui.label(
                    RichText::new("No hay datos suficientes para mostrar este gráfico.")
                        .color(Color32::from_rgb(200, 140, 0)),
                );
            }
            Some(view) => {
                chart(ui, view, &state.program_colors);
                if ui
                    .button(format!("Descargar datos de {} como XLSX", kind.title()))
                    .clicked()
                {
                    pending = Some(Download::View(*kind));
                }
            }
        }
        ui.separator();
    }

    ui.heading("Datos Filtrados");
    ui.label(format!("Número de registros mostrados: {}", dash.filtered.len()));
    table::filtered_table(ui, &dash.filtered);
    if ui.button("Descargar datos filtrados como XLSX").clicked() {
        pending = Some(Download::Filtered);
    }

    if let Some(download) = pending {
        download.run(state);
    }
}

/// Draw one view.
fn chart(ui: &mut Ui, view: &ViewData, colors: &ColorMap) {
    let id = view.kind.label();
    match &view.chart {
        Chart::Scatter(points) => {
            let hover = points.clone();
            Plot::new(id)
                .height(CHART_HEIGHT)
                .x_axis_label("Autoevaluación")
                .y_axis_label("Nota Director")
                .label_formatter(move |_name, at| hover_label(&hover, at))
                .show(ui, |plot_ui| {
                    plot_ui.points(
                        Points::new(xy(points, |_| 0.0))
                            .name("Docentes")
                            .radius(3.5)
                            .color(Color32::from_rgb(20, 142, 64)),
                    );
                });
        }
        Chart::Distribution(groups) => {
            let names: Vec<String> = groups.iter().map(|g| g.key.clone()).collect();
            let all_points: Vec<Point> =
                groups.iter().flat_map(|g| g.points.iter().cloned()).collect();
            Plot::new(id)
                .height(CHART_HEIGHT)
                .legend(Legend::default())
                .x_axis_label("Programa")
                .y_axis_label("Nota Definitiva")
                .x_axis_formatter(category_formatter(names))
                .label_formatter(move |_name, at| hover_label(&all_points, at))
                .show(ui, |plot_ui| {
                    for (i, group) in groups.iter().enumerate() {
                        let color = colors.color_for(&group.key);
                        let s = &group.stats;
                        let elem = BoxElem::new(
                            i as f64,
                            BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
                        )
                        .name(&group.key)
                        .box_width(0.5);
                        plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&group.key).color(color));
                        plot_ui.points(
                            Points::new(xy(&group.points, jitter))
                                .name(&group.key)
                                .radius(2.0)
                                .color(color),
                        );
                    }
                });
        }
        Chart::Ranking(means) => {
            // Best teacher on top.
            let names: Vec<String> = means.iter().rev().map(|g| g.key.clone()).collect();
            let n = means.len();
            let bars: Vec<Bar> = means
                .iter()
                .enumerate()
                .map(|(i, g)| Bar::new((n - 1 - i) as f64, g.mean).name(&g.key).width(0.6))
                .collect();
            Plot::new(id)
                .height(CHART_HEIGHT)
                .x_axis_label("Nota Definitiva Promedio")
                .y_axis_label("Profesor")
                .y_axis_formatter(category_formatter(names))
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(
                        BarChart::new(bars)
                            .horizontal()
                            .color(Color32::from_rgb(20, 142, 64)),
                    );
                });
        }
        Chart::Bars(means) => {
            let names: Vec<String> = means.iter().map(|g| g.key.clone()).collect();
            let bars: Vec<Bar> = means
                .iter()
                .enumerate()
                .map(|(i, g)| Bar::new(i as f64, g.mean).name(&g.key).width(0.6))
                .collect();
            Plot::new(id)
                .height(CHART_HEIGHT)
                .x_axis_label("Materia")
                .y_axis_label("Promedio de Nota Definitiva")
                .x_axis_formatter(category_formatter(names))
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new(bars).color(Color32::from_rgb(255, 99, 71)));
                });
        }
        Chart::Line(means) => {
            let names: Vec<String> = means.iter().map(|g| g.key.clone()).collect();
            let hover = means.clone();
            Plot::new(id)
                .height(CHART_HEIGHT)
                .x_axis_label("Periodo")
                .y_axis_label("Promedio de Nota Definitiva")
                .x_axis_formatter(category_formatter(names))
                .label_formatter(move |_name, at| mean_label(&hover, at))
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new(series(means))
                            .name("Promedio")
                            .color(Color32::from_rgb(20, 142, 64))
                            .width(2.0),
                    );
                    plot_ui.points(
                        Points::new(series(means))
                            .radius(4.0)
                            .color(Color32::from_rgb(20, 142, 64)),
                    );
                });
        }
        Chart::Strip { categories, points } => {
            let hover = points.clone();
            Plot::new(id)
                .height(CHART_HEIGHT)
                .x_axis_label("Nota Definitiva")
                .y_axis_label("Materia")
                .y_axis_formatter(category_formatter(categories.clone()))
                .label_formatter(move |_name, at| hover_label(&hover, at))
                .show(ui, |plot_ui| {
                    plot_ui.points(
                        Points::new(
                            points
                                .iter()
                                .enumerate()
                                .map(|(i, p)| [p.x, p.y + jitter(i)])
                                .collect::<PlotPoints>(),
                        )
                        .name("Docentes")
                        .radius(3.0)
                        .color(Color32::from_rgb(255, 99, 71)),
                    );
                });
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Points as plot coordinates, offsetting x by `dx(i)`.
fn xy(points: &[Point], dx: impl Fn(usize) -> f64) -> PlotPoints {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| [p.x + dx(i), p.y])
        .collect()
}

fn series(means: &[GroupMean]) -> PlotPoints {
    means
        .iter()
        .enumerate()
        .map(|(i, g)| [i as f64, g.mean])
        .collect()
}

/// Small deterministic offset so overlapping points stay visible.
fn jitter(i: usize) -> f64 {
    ((i * 37) % 21) as f64 / 100.0 - 0.1
}

/// Axis formatter naming integer positions after categories.
fn category_formatter(names: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| category_label(&names, mark.value)
}

fn category_label(names: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    names.get(idx as usize).cloned().unwrap_or_default()
}

/// The record closest to the cursor.
pub fn nearest<'p>(points: &'p [Point], at: &PlotPoint) -> Option<&'p Point> {
    points.iter().min_by(|a, b| {
        let da = (a.x - at.x).powi(2) + (a.y - at.y).powi(2);
        let db = (b.x - at.x).powi(2) + (b.y - at.y).powi(2);
        da.total_cmp(&db)
    })
}

fn hover_label(points: &[Point], at: &PlotPoint) -> String {
    match nearest(points, at) {
        Some(p) => format!("{}\n({:.2}, {:.2})", p.hover, p.x, p.y),
        None => String::new(),
    }
}

fn mean_label(means: &[GroupMean], at: &PlotPoint) -> String {
    let idx = at.x.round();
    if idx < 0.0 {
        return String::new();
    }
    match means.get(idx as usize) {
        Some(g) => format!("{}\npromedio {:.2} ({} registros)", g.key, g.mean, g.count),
        None => String::new(),
    }
}

impl Download {
    /// Build the requested buffer and hand it to the save dialog.
    fn run(self, state: &mut AppState) {
        match self {
            Download::View(kind) => {
                let buffer = match (&state.session, &state.dashboard) {
                    (Some(session), Some(dash)) => {
                        find_view(&dash.views, kind).map(|v| session.export_view(v))
                    }
                    _ => None,
                };
                if let Some(buffer) = buffer {
                    state.save_download(&file_name_for(kind), buffer);
                }
            }
            Download::Filtered => {
                let buffer = match (state.session.as_mut(), state.dashboard.as_ref()) {
                    (Some(session), Some(dash)) => Some(session.export_filtered(dash)),
                    _ => None,
                };
                if let Some(buffer) = buffer {
                    state.save_download(profe_score::export::FILTERED_FILE_NAME, buffer);
                }
            }
        }
    }
}

fn find_view(views: &[(ViewKind, Option<ViewData>)], kind: ViewKind) -> Option<&ViewData> {
    views
        .iter()
        .find(|(k, _)| *k == kind)
        .and_then(|(_, v)| v.as_ref())
}
