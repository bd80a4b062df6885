use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::model::{Dataset, Record};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// ChartKind
// ---------------------------------------------------------------------------

/// The chart types the dashboard can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Scatter,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [ChartKind::Bar, ChartKind::Line, ChartKind::Scatter, ChartKind::Pie];

    /// Label shown on the radio buttons and in chart titles.
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::Line => "Line Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Pie => "Pie Chart",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartKind {
    type Err = DashboardError;

    /// Accepts the short names and the UI labels, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" | "bar chart" => Ok(ChartKind::Bar),
            "line" | "line chart" => Ok(ChartKind::Line),
            "scatter" | "scatter plot" => Ok(ChartKind::Scatter),
            "pie" | "pie chart" => Ok(ChartKind::Pie),
            _ => Err(DashboardError::UnsupportedChartKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChartKind {
    type Error = DashboardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Feature policy
// ---------------------------------------------------------------------------

/// Picks the feature when the user has not chosen one: the preferred column
/// if the dataset has it as a numeric feature, else the first feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeaturePolicy {
    pub preferred: Option<String>,
}

impl FeaturePolicy {
    pub fn pick<'d>(&self, dataset: &'d Dataset) -> Option<&'d str> {
        self.preferred
            .as_deref()
            .and_then(|p| dataset.features.iter().find(|f| *f == p))
            .or_else(|| dataset.features.first())
            .map(String::as_str)
    }

    /// Default second axis for scatter plots: the first feature that is not
    /// `feature`.
    pub fn default_secondary<'d>(&self, dataset: &'d Dataset, feature: &str) -> Option<&'d str> {
        dataset
            .features
            .iter()
            .find(|f| *f != feature)
            .map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Inclusive year bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    pub fn is_single_year(&self) -> bool {
        self.min == self.max
    }
}

/// Raw widget values, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionInput {
    pub countries: Vec<String>,
    pub year_range: (i32, i32),
    pub feature: Option<String>,
    pub secondary_feature: Option<String>,
    pub chart_kind: ChartKind,
}

/// One coherent, validated choice of filters and chart parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    countries: BTreeSet<String>,
    year_range: YearRange,
    feature: String,
    secondary_feature: Option<String>,
    chart_kind: ChartKind,
}

impl Selection {
    /// Validate `input` against the dataset's countries, year bounds and
    /// numeric columns.
    pub fn new(
        dataset: &Dataset,
        input: SelectionInput,
        policy: &FeaturePolicy,
    ) -> Result<Self, DashboardError> {
        if input.countries.is_empty() {
            return Err(DashboardError::invalid("select at least one country"));
        }
        if let Some(unknown) = input.countries.iter().find(|c| !dataset.has_country(c)) {
            return Err(DashboardError::invalid(format!("unknown country '{unknown}'")));
        }

        let (min, max) = input.year_range;
        if min > max {
            return Err(DashboardError::invalid(format!(
                "year range is inverted ({min} > {max})"
            )));
        }
        let (lo, hi) = dataset
            .year_bounds
            .ok_or_else(|| DashboardError::invalid("dataset has no years"))?;
        if min < lo || max > hi {
            return Err(DashboardError::invalid(format!(
                "year range {min}-{max} is outside the data ({lo}-{hi})"
            )));
        }

        let feature = match input.feature {
            Some(f) if dataset.is_feature(&f) => f,
            Some(f) => {
                return Err(DashboardError::invalid(format!("'{f}' is not a numeric column")));
            }
            None => policy
                .pick(dataset)
                .map(str::to_string)
                .ok_or_else(|| DashboardError::invalid("dataset has no numeric columns"))?,
        };

        let secondary_feature = match input.chart_kind {
            ChartKind::Scatter => {
                let second = input.secondary_feature.ok_or_else(|| {
                    DashboardError::invalid("scatter plot needs a second feature")
                })?;
                if !dataset.is_feature(&second) {
                    return Err(DashboardError::invalid(format!(
                        "'{second}' is not a numeric column"
                    )));
                }
                if second == feature {
                    return Err(DashboardError::invalid(format!(
                        "scatter plot needs two different features, got '{feature}' twice"
                    )));
                }
                Some(second)
            }
            ChartKind::Bar | ChartKind::Line | ChartKind::Pie => None,
        };

        Ok(Selection {
            countries: input.countries.into_iter().collect(),
            year_range: YearRange { min, max },
            feature,
            secondary_feature,
            chart_kind: input.chart_kind,
        })
    }

    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn year_range(&self) -> YearRange {
        self.year_range
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Always `Some` for scatter plots, `None` otherwise.
    pub fn secondary_feature(&self) -> Option<&str> {
        self.secondary_feature.as_deref()
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.chart_kind
    }

    /// The filter predicate: country selected and year within range.
    pub fn matches(&self, record: &Record) -> bool {
        self.countries.contains(&record.country) && self.year_range.contains(record.year)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::data::model::{ColumnInfo, ColumnKind};

    /// Countries A, B, C observed 2019-2021 (C has no GDP for 2021), D only
    /// in 2018. Rows are ordered by year, then country.
    pub fn dataset() -> Dataset {
        let rows: [(&str, i32, Option<f64>, f64); 10] = [
            ("D", 2018, Some(9.0), 40.0),
            ("A", 2019, Some(1.0), 10.0),
            ("B", 2019, Some(4.0), 20.0),
            ("C", 2019, Some(7.0), 30.0),
            ("A", 2020, Some(2.0), 11.0),
            ("B", 2020, Some(5.0), 21.0),
            ("C", 2020, Some(8.0), 31.0),
            ("A", 2021, Some(3.0), 12.0),
            ("B", 2021, Some(6.0), 22.0),
            ("C", 2021, None, 32.0),
        ];
        let records = rows
            .iter()
            .map(|&(country, year, gdp, pop)| {
                let mut metrics = std::collections::BTreeMap::new();
                if let Some(g) = gdp {
                    metrics.insert("GDP".to_string(), g);
                }
                metrics.insert("Population".to_string(), pop);
                Record {
                    country: country.to_string(),
                    year,
                    metrics,
                }
            })
            .collect();
        let columns = vec![
            ColumnInfo::new("Country", ColumnKind::Text),
            ColumnInfo::new("Year", ColumnKind::Numeric),
            ColumnInfo::new("GDP", ColumnKind::Numeric),
            ColumnInfo::new("Population", ColumnKind::Numeric),
            ColumnInfo::new("Continent", ColumnKind::Text),
        ];
        Dataset::new(columns, records, "Country", "Year")
    }

    pub fn input(countries: &[&str], years: (i32, i32), kind: ChartKind) -> SelectionInput {
        SelectionInput {
            countries: countries.iter().map(|c| c.to_string()).collect(),
            year_range: years,
            feature: Some("GDP".to_string()),
            secondary_feature: (kind == ChartKind::Scatter).then(|| "Population".to_string()),
            chart_kind: kind,
        }
    }
}
