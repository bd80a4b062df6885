mod app;
mod color;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use app::DashboardApp;
use clap::Parser;
use eframe::egui;
use global_metrics::DashboardConfig;
use state::AppState;

/// Loaded at startup when no dataset path is given and the file exists.
const DEFAULT_DATASET: &str = "Dataset.csv";

#[derive(Parser, Debug)]
#[command(name = "global-metrics")]
#[command(about = "Interactive dashboard over per-country, per-year metrics", long_about = None)]
struct Args {
    /// Dataset to open (.csv, .tsv, .txt, .json, .parquet)
    dataset: Option<PathBuf>,

    /// JSON file overriding column names, defaults and export settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    let mut state = AppState::new(config);
    match &args.dataset {
        Some(path) => state
            .load_path(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None if Path::new(DEFAULT_DATASET).exists() => {
            if let Err(e) = state.load_path(Path::new(DEFAULT_DATASET)) {
                log::warn!("Could not load {DEFAULT_DATASET}: {e:#}");
            }
        }
        None => {}
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Global Metrics Analysis",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
