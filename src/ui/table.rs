use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

/// Raw rows behind the chart, projected to country, year and the selected
/// feature.
pub fn raw_data_table(ui: &mut Ui, state: &AppState) {
    let (Some(view), Some(feature)) = (state.filtered_view(), state.active_feature.as_deref()) else {
        return;
    };
    let dataset = view.dataset();
    let rows = view.project(feature);

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(140.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong(dataset.country_column.as_str());
            });
            header.col(|ui| {
                ui.strong(dataset.year_column.as_str());
            });
            header.col(|ui| {
                ui.strong(feature);
            });
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let r = &rows[row.index()];
                row.col(|ui| {
                    ui.label(r.country);
                });
                row.col(|ui| {
                    ui.label(r.year.to_string());
                });
                row.col(|ui| {
                    ui.label(r.value.map(|v| v.to_string()).unwrap_or_default());
                });
            });
        });
}
