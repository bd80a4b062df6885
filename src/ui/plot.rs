use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Color32, RichText, Sense, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use global_metrics::chart::{ChartBody, ChartSpec, PieSlice, ScatterSeries};

use crate::color::ColorMap;
use crate::state::{AppState, ChartState};
use crate::ui::table;

/// Largest angle of one pie wedge polygon; keeps every polygon convex.
const MAX_WEDGE: f32 = 0.1;

// ---------------------------------------------------------------------------
// Chart panel (central panel)
// ---------------------------------------------------------------------------

/// Render the chart (or the reason there is none) and the optional raw table.
pub fn chart_panel(ui: &mut Ui, state: &AppState) {
    match &state.chart {
        ChartState::Idle => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a file to view metrics  (File → Open…)");
            });
            return;
        }
        ChartState::Invalid(msg) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(RichText::new(msg.as_str()).color(Color32::RED).heading());
            });
            return;
        }
        ChartState::NoData => {
            ui.add_space(24.0);
            ui.vertical_centered(|ui: &mut Ui| {
                ui.heading("No data for the current selection.");
            });
        }
        ChartState::Ready(spec) => {
            let height = if state.show_raw_data {
                ui.available_height() * 0.6
            } else {
                ui.available_height()
            };
            let fallback;
            let colors = match &state.color_map {
                Some(cm) => cm,
                None => {
                    fallback = ColorMap::new(&[]);
                    &fallback
                }
            };
            ui.heading(spec.title.as_str());
            draw_chart(ui, spec, colors, height);
        }
    }

    if state.show_raw_data {
        ui.separator();
        table::raw_data_table(ui, state);
    }
}

fn draw_chart(ui: &mut Ui, spec: &ChartSpec, colors: &ColorMap, height: f32) {
    if let ChartBody::Pie { slices } = &spec.body {
        pie_chart(ui, slices, colors, height);
        return;
    }

    let y_label = spec.y_fields.first().cloned().unwrap_or_default();
    let mut plot = Plot::new("metrics_plot")
        .legend(Legend::default())
        .height(height)
        .x_axis_label(spec.x_field.clone())
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);

    // Single-year bars sit at x = 0, 1, 2...; label those ticks by country.
    if let ChartBody::Bars { bars } = &spec.body {
        let countries: Vec<String> = bars.iter().map(|b| b.country.clone()).collect();
        plot = plot.x_axis_formatter(move |mark, _range| bar_tick_label(&countries, mark.value));
    }

    plot.show(ui, |plot_ui| match &spec.body {
        ChartBody::Bars { bars } => {
            for (i, bar) in bars.iter().enumerate() {
                let chart = BarChart::new(vec![Bar::new(i as f64, bar.value)
                    .width(0.7)
                    .name(&bar.country)])
                .color(colors.color_for(&bar.country))
                .name(&bar.country);
                plot_ui.bar_chart(chart);
            }
        }
        ChartBody::GroupedBars { years, series } => {
            // Bars of one year share a slot of width 0.8 centred on it.
            let width = 0.8 / series.len().max(1) as f64;
            for (s_idx, s) in series.iter().enumerate() {
                let offset = -0.4 + width * (s_idx as f64 + 0.5);
                let bars = years
                    .iter()
                    .zip(&s.values)
                    .filter_map(|(&year, value)| {
                        let v = (*value)?;
                        Some(
                            Bar::new(year as f64 + offset, v)
                                .width(width)
                                .name(format!("{} {year}", s.country)),
                        )
                    })
                    .collect();
                let chart = BarChart::new(bars)
                    .color(colors.color_for(&s.country))
                    .name(&s.country);
                plot_ui.bar_chart(chart);
            }
        }
        ChartBody::Lines { series } => {
            for s in series.iter().filter(|s| !s.points.is_empty()) {
                let color = colors.color_for(&s.country);
                let points: PlotPoints = s
                    .points
                    .iter()
                    .map(|&(year, v)| [year as f64, v])
                    .collect();
                plot_ui.line(Line::new(points).name(&s.country).color(color).width(2.0));

                let markers: PlotPoints = s
                    .points
                    .iter()
                    .map(|&(year, v)| [year as f64, v])
                    .collect();
                plot_ui.points(Points::new(markers).radius(3.0).color(color).name(&s.country));
            }
        }
        ChartBody::Scatter { series } => {
            let max_size = max_point_size(series);
            for s in series {
                let color = colors.color_for(&s.country);
                for p in &s.points {
                    let radius = match (p.size, max_size) {
                        (Some(size), Some(max)) if size > 0.0 => {
                            3.0 + 15.0 * (size / max).sqrt() as f32
                        }
                        _ => 5.0,
                    };
                    plot_ui.points(
                        Points::new(PlotPoints::new(vec![[p.x, p.y]]))
                            .radius(radius)
                            .color(color)
                            .name(&s.country),
                    );
                }
            }
        }
        ChartBody::Pie { .. } => {}
    });
}

fn bar_tick_label(countries: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    countries.get(index as usize).cloned().unwrap_or_default()
}

fn max_point_size(series: &[ScatterSeries]) -> Option<f64> {
    series
        .iter()
        .flat_map(|s| s.points.iter())
        .filter_map(|p| p.size)
        .filter(|&v| v > 0.0)
        .fold(None::<f64>, |acc, v| Some(f64::max(acc.unwrap_or(v), v)))
}

// ---------------------------------------------------------------------------
// Pie chart (egui_plot has no pie, so it is painted directly)
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, slices: &[PieSlice], colors: &ColorMap, height: f32) {
    ui.horizontal(|ui: &mut Ui| {
        let side = height.min(ui.available_width() * 0.6).max(50.0);
        let (response, painter) = ui.allocate_painter(Vec2::splat(side), Sense::hover());
        let center = response.rect.center();
        let radius = side * 0.45;

        let mut start = -FRAC_PI_2;
        for slice in slices.iter().filter(|s| s.share > 0.0) {
            let sweep = slice.share as f32 * TAU;
            let color = colors.color_for(&slice.country);
            let steps = (sweep / MAX_WEDGE).ceil().max(1.0) as usize;
            for step in 0..steps {
                let a0 = start + sweep * step as f32 / steps as f32;
                let a1 = start + sweep * (step + 1) as f32 / steps as f32;
                painter.add(egui::Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * Vec2::angled(a0),
                        center + radius * Vec2::angled(a1),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            start += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for slice in slices {
                let text = format!(
                    "■ {}: {} ({:.1}%)",
                    slice.country,
                    slice.value,
                    slice.share * 100.0
                );
                ui.label(RichText::new(text).color(colors.color_for(&slice.country)));
            }
        });
    });
}
