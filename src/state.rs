use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use global_metrics::chart::{ChartOutcome, ChartSpec};
use global_metrics::data::filter::FilteredView;
use global_metrics::data::model::Dataset;
use global_metrics::{ChartKind, Dashboard, DashboardConfig, SelectionInput};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Widget values
// ---------------------------------------------------------------------------

/// Raw values of the side-panel widgets. Compared frame to frame so a
/// change triggers exactly one recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub countries: BTreeSet<String>,
    pub year_min: i32,
    pub year_max: i32,
    pub feature: Option<String>,
    pub secondary_feature: Option<String>,
    pub chart_kind: ChartKind,
}

impl Controls {
    fn from_input(input: SelectionInput) -> Self {
        Self {
            countries: input.countries.into_iter().collect(),
            year_min: input.year_range.0,
            year_max: input.year_range.1,
            feature: input.feature,
            secondary_feature: input.secondary_feature,
            chart_kind: input.chart_kind,
        }
    }

    fn to_input(&self) -> SelectionInput {
        SelectionInput {
            countries: self.countries.iter().cloned().collect(),
            year_range: (self.year_min, self.year_max),
            feature: self.feature.clone(),
            secondary_feature: self.secondary_feature.clone(),
            chart_kind: self.chart_kind,
        }
    }
}

/// Message shown in the top bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// What the central panel shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartState {
    /// No dataset loaded yet.
    Idle,
    Ready(ChartSpec),
    NoData,
    /// The current widget values do not form a valid selection.
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until user loads a file).
    pub dashboard: Option<Dashboard>,

    pub controls: Controls,

    /// Whether the raw-data table is shown under the chart.
    pub show_raw_data: bool,

    /// Indices of records passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// Feature of the last valid selection, used by the table and export.
    pub active_feature: Option<String>,

    pub chart: ChartState,

    /// Per-country colours for the loaded dataset.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<Status>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dashboard: None,
            controls: Controls::default(),
            show_raw_data: false,
            visible_indices: Vec::new(),
            active_feature: None,
            chart: ChartState::Idle,
            color_map: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset, reset the widgets and recompute.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.color_map = Some(ColorMap::new(&dataset.countries));
        let loaded = format!("Data loaded successfully! {} records", dataset.len());
        let dashboard = Dashboard::new(dataset, self.config.clone());
        self.controls = Controls::from_input(dashboard.default_input());
        self.dashboard = Some(dashboard);
        self.status_message = Some(Status::Info(loaded));
        self.recompute();
    }

    /// Load a file through the data source and ingest it.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let dataset = global_metrics::data::loader::load_file(path, &self.config)?;
        self.set_dataset(dataset);
        Ok(())
    }

    /// Recompute the filtered view and chart from the current controls.
    pub fn recompute(&mut self) {
        let Some(dashboard) = &self.dashboard else {
            self.chart = ChartState::Idle;
            return;
        };

        match dashboard.evaluate(self.controls.to_input()) {
            Ok(eval) => {
                self.visible_indices = eval.view.indices().to_vec();
                self.active_feature = Some(eval.selection.feature().to_string());
                self.chart = match eval.outcome {
                    ChartOutcome::Chart(spec) => ChartState::Ready(spec),
                    ChartOutcome::NoData => ChartState::NoData,
                };
            }
            Err(e) => {
                self.visible_indices.clear();
                self.active_feature = None;
                self.chart = ChartState::Invalid(e.to_string());
            }
        }
    }

    /// The rows behind the current chart.
    pub fn filtered_view(&self) -> Option<FilteredView<'_>> {
        let dashboard = self.dashboard.as_ref()?;
        Some(FilteredView::from_indices(
            dashboard.dataset(),
            &self.visible_indices,
        ))
    }

    /// Write the filtered rows, projected to country/year/feature, to `path`.
    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let view = self.filtered_view().context("no dataset loaded")?;
        let feature = self
            .active_feature
            .as_deref()
            .context("no valid selection to export")?;
        global_metrics::export::write_csv(path, &view, feature, &self.config)
    }

    pub fn select_all_countries(&mut self) {
        if let Some(dashboard) = &self.dashboard {
            self.controls.countries = dashboard.dataset().countries.iter().cloned().collect();
        }
    }

    pub fn select_no_countries(&mut self) {
        self.controls.countries.clear();
    }

    /// Keep the secondary feature usable when the primary one changes: if
    /// both now name the same column, fall back to the default second axis.
    pub fn fix_secondary_feature(&mut self) {
        let Some(dashboard) = &self.dashboard else {
            return;
        };
        let Some(feature) = self.controls.feature.as_deref() else {
            return;
        };
        if self.controls.secondary_feature.as_deref() == Some(feature) {
            self.controls.secondary_feature = self
                .config
                .feature_policy()
                .default_secondary(dashboard.dataset(), feature)
                .map(str::to_string);
        }
    }
}
