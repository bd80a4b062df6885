//! Chart resolution: maps a filtered view and a selection to a declarative,
//! renderer-agnostic [`ChartSpec`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::DashboardConfig;
use crate::data::filter::FilteredView;
use crate::data::model::Record;
use crate::error::DashboardError;
use crate::selection::{ChartKind, Selection};

// =============================================================================
// Chart description
// =============================================================================

/// A chart to draw. Field names refer to dataset columns; `body` carries the
/// marks already resolved from the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_field: String,
    pub y_fields: Vec<String>,
    pub color_field: Option<String>,
    /// Scatter only.
    pub size_field: Option<String>,
    pub body: ChartBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartBody {
    /// Single-year bar chart: one bar per country.
    Bars { bars: Vec<BarMark> },
    /// Multi-year bar chart: one group per year, one bar per country inside
    /// each group.
    GroupedBars {
        years: Vec<i32>,
        series: Vec<GroupedSeries>,
    },
    Lines { series: Vec<LineSeries> },
    Scatter { series: Vec<ScatterSeries> },
    Pie { slices: Vec<PieSlice> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarMark {
    pub country: String,
    pub value: f64,
}

/// One country's bars across the year groups; `values[i]` belongs to
/// `years[i]` and is `None` where the country has no value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSeries {
    pub country: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub country: String,
    /// `(year, value)` sorted by year.
    pub points: Vec<(i32, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub size: Option<f64>,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub country: String,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub country: String,
    /// Sum of the feature over the country's rows in the view.
    pub value: f64,
    /// `value / total`, or 0 when the total is not positive.
    pub share: f64,
}

/// Result of resolving one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartOutcome {
    Chart(ChartSpec),
    /// The filters matched no record; nothing is plotted.
    NoData,
}

impl ChartOutcome {
    pub fn chart(&self) -> Option<&ChartSpec> {
        match self {
            ChartOutcome::Chart(spec) => Some(spec),
            ChartOutcome::NoData => None,
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve the chart for `selection` over `view`.
///
/// An empty view short-circuits to [`ChartOutcome::NoData`] before any axis
/// is computed.
pub fn resolve(
    view: &FilteredView<'_>,
    selection: &Selection,
    config: &DashboardConfig,
) -> Result<ChartOutcome, DashboardError> {
    if view.is_empty() {
        return Ok(ChartOutcome::NoData);
    }

    let dataset = view.dataset();
    let country_col = dataset.country_column.as_str();
    let year_col = dataset.year_column.as_str();
    let feature = selection.feature();
    let years = selection.year_range();

    let spec = match selection.chart_kind() {
        ChartKind::Bar if years.is_single_year() => ChartSpec {
            kind: ChartKind::Bar,
            title: format!("Bar Chart: {feature} by Country in {}", years.min),
            x_field: country_col.to_string(),
            y_fields: vec![feature.to_string()],
            color_field: None,
            size_field: None,
            body: single_year_bars(view, feature),
        },
        ChartKind::Bar => ChartSpec {
            kind: ChartKind::Bar,
            title: format!("Bar Chart: {feature} by Country, {}-{}", years.min, years.max),
            x_field: year_col.to_string(),
            y_fields: vec![feature.to_string()],
            color_field: Some(country_col.to_string()),
            size_field: None,
            body: grouped_bars(view, feature),
        },
        ChartKind::Line => ChartSpec {
            kind: ChartKind::Line,
            title: format!("Line Chart: {feature} Over Time by Country"),
            x_field: year_col.to_string(),
            y_fields: vec![feature.to_string()],
            color_field: Some(country_col.to_string()),
            size_field: None,
            body: lines(view, feature),
        },
        ChartKind::Scatter => {
            let secondary = selection.secondary_feature().ok_or_else(|| {
                DashboardError::invalid("scatter plot needs a second feature")
            })?;
            let size_field = config
                .size_field
                .as_deref()
                .filter(|s| dataset.is_feature(s))
                .map(str::to_string);
            ChartSpec {
                kind: ChartKind::Scatter,
                title: format!("Scatter Plot: {feature} vs {secondary} by Country"),
                x_field: feature.to_string(),
                y_fields: vec![secondary.to_string()],
                color_field: Some(country_col.to_string()),
                body: scatter(view, feature, secondary, size_field.as_deref()),
                size_field,
            }
        }
        ChartKind::Pie => ChartSpec {
            kind: ChartKind::Pie,
            title: format!("Pie Chart: {feature} Distribution by Country"),
            x_field: country_col.to_string(),
            y_fields: vec![feature.to_string()],
            color_field: Some(country_col.to_string()),
            size_field: None,
            body: pie(view, feature),
        },
    };

    log::debug!("Resolved {} over {} rows", spec.title, view.len());
    Ok(ChartOutcome::Chart(spec))
}

/// Group the view's records by country, countries in first-appearance order.
fn by_country<'a>(view: &FilteredView<'a>) -> Vec<(&'a str, Vec<&'a Record>)> {
    let mut groups: Vec<(&'a str, Vec<&'a Record>)> = Vec::new();
    for record in view.records() {
        match groups.iter_mut().find(|(c, _)| *c == record.country) {
            Some((_, rows)) => rows.push(record),
            None => groups.push((record.country.as_str(), vec![record])),
        }
    }
    groups
}

/// Sum of the present values, `None` if no row has one.
fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values.flatten().fold(None::<f64>, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

fn single_year_bars(view: &FilteredView<'_>, feature: &str) -> ChartBody {
    let bars = by_country(view)
        .into_iter()
        .filter_map(|(country, rows)| {
            let value = sum_present(rows.iter().map(|r| r.metric(feature)))?;
            Some(BarMark {
                country: country.to_string(),
                value,
            })
        })
        .collect();
    ChartBody::Bars { bars }
}

fn grouped_bars(view: &FilteredView<'_>, feature: &str) -> ChartBody {
    let years: Vec<i32> = view
        .records()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let series = by_country(view)
        .into_iter()
        .map(|(country, rows)| {
            let mut per_year: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
            for r in rows {
                per_year.entry(r.year).or_default().push(r.metric(feature));
            }
            let values = years
                .iter()
                .map(|y| {
                    per_year
                        .get(y)
                        .and_then(|vals| sum_present(vals.iter().copied()))
                })
                .collect();
            GroupedSeries {
                country: country.to_string(),
                values,
            }
        })
        .collect();

    ChartBody::GroupedBars { years, series }
}

fn lines(view: &FilteredView<'_>, feature: &str) -> ChartBody {
    let series = by_country(view)
        .into_iter()
        .map(|(country, rows)| {
            let mut points: Vec<(i32, f64)> = rows
                .iter()
                .filter_map(|r| Some((r.year, r.metric(feature)?)))
                .collect();
            points.sort_by_key(|&(year, _)| year);
            LineSeries {
                country: country.to_string(),
                points,
            }
        })
        .collect();
    ChartBody::Lines { series }
}

fn scatter(
    view: &FilteredView<'_>,
    x_feature: &str,
    y_feature: &str,
    size_field: Option<&str>,
) -> ChartBody {
    let series = by_country(view)
        .into_iter()
        .map(|(country, rows)| ScatterSeries {
            country: country.to_string(),
            points: rows
                .iter()
                .filter_map(|r| {
                    Some(ScatterPoint {
                        x: r.metric(x_feature)?,
                        y: r.metric(y_feature)?,
                        size: size_field.and_then(|s| r.metric(s)),
                        year: r.year,
                    })
                })
                .collect(),
        })
        .collect();
    ChartBody::Scatter { series }
}

fn pie(view: &FilteredView<'_>, feature: &str) -> ChartBody {
    let sums: Vec<(&str, f64)> = by_country(view)
        .into_iter()
        .filter_map(|(country, rows)| {
            Some((country, sum_present(rows.iter().map(|r| r.metric(feature)))?))
        })
        .collect();
    let total: f64 = sums.iter().map(|(_, v)| v).sum();

    let slices = sums
        .into_iter()
        .map(|(country, value)| PieSlice {
            country: country.to_string(),
            value,
            share: if total > 0.0 { value / total } else { 0.0 },
        })
        .collect();
    ChartBody::Pie { slices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter;
    use crate::data::model::Dataset;
    use crate::selection::test_support::{dataset, input};
    use crate::selection::FeaturePolicy;

    fn run(ds: &Dataset, countries: &[&str], years: (i32, i32), kind: ChartKind) -> ChartOutcome {
        let sel = Selection::new(ds, input(countries, years, kind), &FeaturePolicy::default()).unwrap();
        let view = filter(ds, &sel);
        resolve(&view, &sel, &DashboardConfig::default()).unwrap()
    }

    fn expect_chart(outcome: ChartOutcome) -> ChartSpec {
        match outcome {
            ChartOutcome::Chart(spec) => spec,
            ChartOutcome::NoData => panic!("expected a chart"),
        }
    }

    #[test]
    fn test_single_year_bar() {
        let ds = dataset();
        let spec = expect_chart(run(&ds, &["A", "B"], (2020, 2020), ChartKind::Bar));
        assert_eq!(spec.x_field, "Country");
        assert_eq!(spec.title, "Bar Chart: GDP by Country in 2020");
        assert_eq!(
            spec.body,
            ChartBody::Bars {
                bars: vec![
                    BarMark { country: "A".to_string(), value: 2.0 },
                    BarMark { country: "B".to_string(), value: 5.0 },
                ]
            }
        );
    }

    #[test]
    fn test_multi_year_bar_is_grouped() {
        let ds = dataset();
        let spec = expect_chart(run(&ds, &["A", "B", "C"], (2019, 2021), ChartKind::Bar));
        assert_eq!(spec.x_field, "Year");
        assert_eq!(spec.color_field.as_deref(), Some("Country"));
        let ChartBody::GroupedBars { years, series } = spec.body else {
            panic!("expected grouped bars");
        };
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|s| s.values.len() == years.len()));
        assert_eq!(series[0].values, vec![Some(1.0), Some(2.0), Some(3.0)]);
        // C has no GDP for 2021.
        assert_eq!(series[2].values, vec![Some(7.0), Some(8.0), None]);
    }

    #[test]
    fn test_line_series_per_country() {
        let ds = dataset();
        let spec = expect_chart(run(&ds, &["C", "A"], (2019, 2021), ChartKind::Line));
        assert_eq!(spec.title, "Line Chart: GDP Over Time by Country");
        let ChartBody::Lines { series } = spec.body else {
            panic!("expected lines");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].country, "A");
        assert_eq!(series[0].points, vec![(2019, 1.0), (2020, 2.0), (2021, 3.0)]);
        assert_eq!(series[1].points, vec![(2019, 7.0), (2020, 8.0)]);
    }

    #[test]
    fn test_scatter_uses_configured_size() {
        let ds = dataset();
        let sel = Selection::new(&ds, input(&["A"], (2020, 2020), ChartKind::Scatter), &FeaturePolicy::default()).unwrap();
        let view = filter(&ds, &sel);

        let config = DashboardConfig {
            size_field: Some("Population".to_string()),
            ..Default::default()
        };
        let spec = expect_chart(resolve(&view, &sel, &config).unwrap());
        assert_eq!(spec.size_field.as_deref(), Some("Population"));
        assert_eq!(spec.y_fields, vec!["Population".to_string()]);
        let ChartBody::Scatter { series } = spec.body else {
            panic!("expected scatter");
        };
        assert_eq!(series[0].points[0], ScatterPoint { x: 2.0, y: 11.0, size: Some(11.0), year: 2020 });

        // The default size field does not exist in this dataset.
        let spec = expect_chart(resolve(&view, &sel, &DashboardConfig::default()).unwrap());
        assert_eq!(spec.size_field, None);
    }

    #[test]
    fn test_pie_sums_per_country() {
        let ds = dataset();
        let outcome = run(&ds, &["A", "B"], (2019, 2021), ChartKind::Pie);
        let ChartBody::Pie { slices } = expect_chart(outcome.clone()).body else {
            panic!("expected pie");
        };
        assert_eq!(slices[0].value, 6.0);
        assert_eq!(slices[1].value, 15.0);
        assert!((slices[0].share + slices[1].share - 1.0).abs() < 1e-12);

        // Same selection, same slices.
        assert_eq!(run(&ds, &["A", "B"], (2019, 2021), ChartKind::Pie), outcome);
    }

    #[test]
    fn test_empty_view_is_no_data() {
        let ds = dataset();
        assert_eq!(run(&ds, &["D"], (2019, 2021), ChartKind::Bar), ChartOutcome::NoData);
        assert_eq!(run(&ds, &["D"], (2020, 2020), ChartKind::Scatter), ChartOutcome::NoData);
    }

    #[test]
    fn test_spec_serializes() {
        let ds = dataset();
        let spec = expect_chart(run(&ds, &["A"], (2020, 2020), ChartKind::Bar));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "bar");
        assert_eq!(json["body"]["type"], "bars");
    }
}
