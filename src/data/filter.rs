use super::model::{Dataset, Record};
use crate::selection::Selection;

// ---------------------------------------------------------------------------
// FilteredView – the rows matching the current selection
// ---------------------------------------------------------------------------

/// Indices of the dataset rows matching a selection, in dataset order.
///
/// The view borrows the dataset and never mutates it; an empty view is the
/// explicit "no data" marker checked by the chart resolver.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

/// One row of the raw-data table and of the export: country, year and the
/// selected feature (absent when the cell was empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRow<'a> {
    pub country: &'a str,
    pub year: i32,
    pub value: Option<f64>,
}

impl<'a> FilteredView<'a> {
    /// Rebuild a view from indices previously taken with [`Self::indices`].
    /// Out-of-range indices are dropped.
    pub fn from_indices(dataset: &'a Dataset, indices: &[usize]) -> Self {
        Self {
            dataset,
            indices: indices
                .iter()
                .copied()
                .filter(|&i| i < dataset.len())
                .collect(),
        }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Matching records, in dataset order.
    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    /// Apply the selection predicate again to this view's rows.
    pub fn refilter(&self, selection: &Selection) -> FilteredView<'a> {
        FilteredView {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| selection.matches(&self.dataset.records[i]))
                .collect(),
        }
    }

    /// Project every row onto (country, year, feature).
    pub fn project(&self, feature: &str) -> Vec<ProjectedRow<'a>> {
        self.records()
            .map(|r| ProjectedRow {
                country: &r.country,
                year: r.year,
                value: r.metric(feature),
            })
            .collect()
    }
}

/// Return the view of records passing the selection's country and year
/// filters. Stable: dataset order is preserved.
pub fn filter<'a>(dataset: &'a Dataset, selection: &Selection) -> FilteredView<'a> {
    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(r))
        .map(|(i, _)| i)
        .collect();
    FilteredView { dataset, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::test_support::{dataset, input};
    use crate::selection::{ChartKind, FeaturePolicy};

    fn select(ds: &Dataset, countries: &[&str], years: (i32, i32)) -> Selection {
        Selection::new(ds, input(countries, years, ChartKind::Line), &FeaturePolicy::default()).unwrap()
    }

    #[test]
    fn test_filter_sound_and_complete() {
        let ds = dataset();
        let sel = select(&ds, &["A", "C"], (2020, 2021));
        let view = filter(&ds, &sel);

        for r in view.records() {
            assert!(["A", "C"].contains(&r.country.as_str()));
            assert!((2020..=2021).contains(&r.year));
        }
        let expected = ds
            .records
            .iter()
            .filter(|r| (r.country == "A" || r.country == "C") && (2020..=2021).contains(&r.year))
            .count();
        assert_eq!(view.len(), expected);
        assert_eq!(view.len(), 4);
    }

    #[test]
    fn test_filter_preserves_dataset_order() {
        let ds = dataset();
        let sel = select(&ds, &["C", "A"], (2019, 2021));
        let view = filter(&ds, &sel);
        let mut sorted = view.indices().to_vec();
        sorted.sort_unstable();
        assert_eq!(view.indices(), sorted.as_slice());
    }

    #[test]
    fn test_refilter_is_idempotent() {
        let ds = dataset();
        let sel = select(&ds, &["A", "B"], (2020, 2021));
        let view = filter(&ds, &sel);
        let again = view.refilter(&sel);
        assert_eq!(view.indices(), again.indices());
    }

    #[test]
    fn test_refilter_narrows() {
        let ds = dataset();
        let wide = filter(&ds, &select(&ds, &["A", "B", "C"], (2019, 2021)));
        let narrow = select(&ds, &["B"], (2021, 2021));
        let view = wide.refilter(&narrow);
        assert_eq!(view.len(), 1);
        assert_eq!(view.records().next().unwrap().country, "B");
    }

    #[test]
    fn test_no_match_is_empty() {
        let ds = dataset();
        // Country "D" only has 2018 rows.
        let sel = select(&ds, &["D"], (2019, 2021));
        assert!(filter(&ds, &sel).is_empty());
    }

    #[test]
    fn test_project_and_from_indices() {
        let ds = dataset();
        let sel = select(&ds, &["A"], (2020, 2020));
        let view = filter(&ds, &sel);
        let rebuilt = FilteredView::from_indices(&ds, &[view.indices()[0], 999]);
        assert_eq!(rebuilt.len(), 1);

        let rows = rebuilt.project("GDP");
        assert_eq!(
            rows,
            vec![ProjectedRow {
                country: "A",
                year: 2020,
                value: Some(2.0)
            }]
        );
    }
}
