use crate::chart::{self, ChartOutcome};
use crate::config::DashboardConfig;
use crate::data::filter::{self, FilteredView};
use crate::data::model::Dataset;
use crate::error::DashboardError;
use crate::selection::{ChartKind, Selection, SelectionInput};

/// A loaded dataset plus the settings used to evaluate selections over it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Dataset,
    config: DashboardConfig,
}

/// Everything one interaction produces.
#[derive(Debug, Clone)]
pub struct Evaluation<'a> {
    pub selection: Selection,
    pub view: FilteredView<'a>,
    pub outcome: ChartOutcome,
}

impl Dashboard {
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        Self { dataset, config }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Initial widget values: the first few countries, the full year range,
    /// the policy feature and the configured chart kind.
    pub fn default_input(&self) -> SelectionInput {
        let policy = self.config.feature_policy();
        let feature = policy.pick(&self.dataset);
        let (lo, hi) = self.dataset.year_bounds.unwrap_or_default();
        SelectionInput {
            countries: self
                .dataset
                .countries
                .iter()
                .take(self.config.default_country_count)
                .cloned()
                .collect(),
            year_range: (lo, hi),
            feature: feature.map(str::to_string),
            secondary_feature: feature
                .and_then(|f| policy.default_secondary(&self.dataset, f))
                .map(str::to_string),
            chart_kind: self.config.default_chart,
        }
    }

    /// Validate the input, filter, then resolve the chart.
    pub fn evaluate(&self, input: SelectionInput) -> Result<Evaluation<'_>, DashboardError> {
        let selection = Selection::new(&self.dataset, input, &self.config.feature_policy())
            .inspect_err(|e| log::warn!("{e}"))?;
        let view = filter::filter(&self.dataset, &selection);
        let outcome = chart::resolve(&view, &selection, &self.config)?;
        log::debug!(
            "{} of {} rows match {:?} {:?}",
            view.len(),
            self.dataset.len(),
            selection.countries(),
            selection.year_range()
        );
        Ok(Evaluation {
            selection,
            view,
            outcome,
        })
    }

    /// Same as [`Self::evaluate`] with a chart kind given as text.
    pub fn evaluate_named(
        &self,
        mut input: SelectionInput,
        chart_kind: &str,
    ) -> Result<Evaluation<'_>, DashboardError> {
        input.chart_kind = chart_kind.parse::<ChartKind>()?;
        self.evaluate(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::test_support::{dataset, input};

    fn dashboard() -> Dashboard {
        let config = DashboardConfig {
            default_country_count: 2,
            ..Default::default()
        };
        Dashboard::new(dataset(), config)
    }

    #[test]
    fn test_default_input() {
        let dash = dashboard();
        let input = dash.default_input();
        assert_eq!(input.countries, vec!["D", "A"]);
        assert_eq!(input.year_range, (2018, 2021));
        assert_eq!(input.feature.as_deref(), Some("GDP"));
        assert_eq!(input.secondary_feature.as_deref(), Some("Population"));
        assert_eq!(input.chart_kind, ChartKind::Bar);
        assert!(dash.evaluate(input).is_ok());
    }

    #[test]
    fn test_evaluate_runs_pipeline() {
        let dash = dashboard();
        let eval = dash.evaluate(input(&["A", "B"], (2020, 2020), ChartKind::Bar)).unwrap();
        assert_eq!(eval.view.len(), 2);
        assert!(eval.outcome.chart().is_some());
    }

    #[test]
    fn test_evaluate_no_data() {
        let dash = dashboard();
        let eval = dash.evaluate(input(&["D"], (2020, 2021), ChartKind::Pie)).unwrap();
        assert!(eval.view.is_empty());
        assert_eq!(eval.outcome, ChartOutcome::NoData);
    }

    #[test]
    fn test_evaluate_named_rejects_unknown_kind() {
        let dash = dashboard();
        let err = dash
            .evaluate_named(input(&["A"], (2020, 2020), ChartKind::Bar), "radar")
            .unwrap_err();
        assert_eq!(err, DashboardError::UnsupportedChartKind("radar".to_string()));
    }
}
