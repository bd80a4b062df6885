use std::path::Path;

use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::data::filter::FilteredView;

/// Serialise the view projected to (country, year, feature) as delimited
/// text. Missing feature values become empty cells.
pub fn to_csv_bytes(
    view: &FilteredView<'_>,
    feature: &str,
    config: &DashboardConfig,
) -> Result<Vec<u8>> {
    let dataset = view.dataset();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter_byte()?)
        .from_writer(Vec::new());

    writer
        .write_record([dataset.country_column.as_str(), dataset.year_column.as_str(), feature])
        .context("writing header row")?;
    for row in view.project(feature) {
        let year = row.year.to_string();
        let value = row.value.map(|v| v.to_string()).unwrap_or_default();
        writer
            .write_record([row.country, year.as_str(), value.as_str()])
            .with_context(|| format!("writing row for {} {}", row.country, row.year))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing export buffer: {}", e.error()))
}

/// Write [`to_csv_bytes`] output to `path`.
pub fn write_csv(
    path: &Path,
    view: &FilteredView<'_>,
    feature: &str,
    config: &DashboardConfig,
) -> Result<()> {
    let bytes = to_csv_bytes(view, feature, config)?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("writing export to {}", path.display()))?;
    log::info!("Exported {} rows to {}", view.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter;
    use crate::selection::test_support::{dataset, input};
    use crate::selection::{ChartKind, FeaturePolicy, Selection};

    #[test]
    fn test_export_projects_columns() {
        let ds = dataset();
        let sel = Selection::new(&ds, input(&["C"], (2020, 2021), ChartKind::Line), &FeaturePolicy::default()).unwrap();
        let view = filter(&ds, &sel);

        let bytes = to_csv_bytes(&view, sel.feature(), &DashboardConfig::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Country,Year,GDP\nC,2020,8\nC,2021,\n");
    }

    #[test]
    fn test_export_uses_configured_delimiter() {
        let ds = dataset();
        let sel = Selection::new(&ds, input(&["A"], (2019, 2019), ChartKind::Bar), &FeaturePolicy::default()).unwrap();
        let view = filter(&ds, &sel);
        let config = DashboardConfig {
            delimiter: ';',
            ..Default::default()
        };
        let text = String::from_utf8(to_csv_bytes(&view, "Population", &config).unwrap()).unwrap();
        assert_eq!(text, "Country;Year;Population\nA;2019;10\n");
    }
}
