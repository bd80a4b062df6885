use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::selection::{ChartKind, FeaturePolicy};

/// Dashboard settings. Every field has a default, so an empty JSON object
/// (or no config file at all) yields the stock layout of the world-metrics
/// dataset.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Column holding the country identifier.
    pub country_column: String,
    /// Integer-valued year column.
    pub year_column: String,
    /// Feature selected when the user has not picked one.
    pub preferred_feature: Option<String>,
    /// Numeric column driving point size in scatter plots.
    pub size_field: Option<String>,
    /// How many countries are pre-selected after loading.
    pub default_country_count: usize,
    pub default_chart: ChartKind,
    /// Field delimiter for delimited input and export.
    pub delimiter: char,
    /// File name offered when exporting the filtered view.
    pub export_file_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            country_column: "Country".to_string(),
            year_column: "Year".to_string(),
            preferred_feature: Some("GDP (in Trillions USD)".to_string()),
            size_field: Some("Population (in Millions)".to_string()),
            default_country_count: 5,
            default_chart: ChartKind::Bar,
            delimiter: ',',
            export_file_name: "filtered_data.csv".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: DashboardConfig =
            serde_json::from_str(&text).context("parsing config JSON")?;
        config.delimiter_byte()?;
        Ok(config)
    }

    /// The delimiter as the single byte the `csv` crate expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            anyhow::bail!("Delimiter {:?} is not a single ASCII character", self.delimiter)
        }
    }

    pub fn feature_policy(&self) -> FeaturePolicy {
        FeaturePolicy {
            preferred: self.preferred_feature.clone(),
        }
    }
}
