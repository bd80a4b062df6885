use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use global_metrics::ChartKind;

use crate::state::{AppState, Status};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Any widget change triggers one recompute.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dashboard) = &state.dashboard else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the closures.
    let countries = dashboard.dataset().countries.clone();
    let features = dashboard.dataset().features.clone();
    let (first_year, last_year) = dashboard.dataset().year_bounds.unwrap_or_default();
    let before = state.controls.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Countries ----
            let header_text = format!(
                "Select Countries  ({}/{})",
                state.controls.countries.len(),
                countries.len()
            );
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("countries")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_countries();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_countries();
                        }
                    });

                    for country in &countries {
                        let mut text = RichText::new(country.as_str());
                        if let Some(cm) = &state.color_map {
                            text = text.color(cm.color_for(country));
                        }
                        let mut checked = state.controls.countries.contains(country);
                        if ui.checkbox(&mut checked, text).changed() {
                            if checked {
                                state.controls.countries.insert(country.clone());
                            } else {
                                state.controls.countries.remove(country);
                            }
                        }
                    }
                });
            ui.separator();

            // ---- Year range ----
            ui.strong("Select Year Range");
            ui.add(egui::Slider::new(&mut state.controls.year_min, first_year..=last_year).text("from"));
            ui.add(egui::Slider::new(&mut state.controls.year_max, first_year..=last_year).text("to"));
            ui.separator();

            // ---- Feature ----
            ui.strong("Select Feature to Plot");
            feature_combo(ui, "feature", &mut state.controls.feature, &features);
            ui.separator();

            // ---- Chart kind ----
            ui.strong("Select Plot Type");
            for kind in ChartKind::ALL {
                ui.radio_value(&mut state.controls.chart_kind, kind, kind.label());
            }

            if state.controls.chart_kind == ChartKind::Scatter {
                ui.add_space(4.0);
                ui.strong("Select another feature for Scatter Plot");
                let others: Vec<String> = features
                    .iter()
                    .filter(|f| state.controls.feature.as_ref() != Some(*f))
                    .cloned()
                    .collect();
                feature_combo(
                    ui,
                    "secondary_feature",
                    &mut state.controls.secondary_feature,
                    &others,
                );
            }
            ui.separator();

            // ---- Raw data / export ----
            ui.strong("Advanced Customization Options");
            ui.checkbox(&mut state.show_raw_data, "Show Raw Data");
            if ui.button("Download Filtered Data").clicked() {
                save_file_dialog(state);
            }
        });

    if state.controls.feature != before.feature {
        state.fix_secondary_feature();
    }
    if state.controls != before {
        state.recompute();
    }
}

fn feature_combo(ui: &mut Ui, id: &str, value: &mut Option<String>, options: &[String]) {
    let current = value.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt(id)
        .selected_text(current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                ui.selectable_value(value, Some(option.clone()), option.as_str());
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Download Filtered Data…").clicked() {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(dashboard) = &state.dashboard {
            ui.label(format!(
                "{} records loaded, {} visible",
                dashboard.dataset().len(),
                state.visible_indices.len()
            ));
        }

        ui.separator();

        match &state.status_message {
            Some(Status::Info(msg)) => {
                ui.label(msg.as_str());
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg.as_str()).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open metrics dataset")
        .add_filter("Supported files", &["csv", "tsv", "txt", "json", "parquet", "pq"])
        .add_filter("Delimited text", &["csv", "tsv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(Status::Error(format!("Error: {e:#}")));
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Download filtered data")
        .add_filter("CSV", &["csv"])
        .set_file_name(state.config.export_file_name.as_str())
        .save_file();

    if let Some(path) = file {
        state.status_message = Some(match state.export_csv(&path) {
            Ok(()) => Status::Info(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                Status::Error(format!("Error: {e:#}"))
            }
        });
    }
}
