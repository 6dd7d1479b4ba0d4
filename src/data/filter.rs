use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{Dataset, Metric, Record, YearBounds};

// ---------------------------------------------------------------------------
// Filter state: year window, selected types, metric, projection toggle
// ---------------------------------------------------------------------------

/// The user's current selection. Transitions return a new value; the
/// pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    pub year_min: i32,
    pub year_max: i32,
    pub selected_types: BTreeSet<String>,
    pub metric: Metric,
    pub show_projection: bool,
    /// Year span of the loaded data, used to clamp the range handles.
    #[serde(skip)]
    pub bounds: YearBounds,
    /// Every type observed at load; selections never leave this set.
    #[serde(skip)]
    known_types: BTreeSet<String>,
}

/// Initialise a [`FilterState`] with everything selected: full year span,
/// all types, the default metric, projection off.
pub fn init_filter_state(dataset: &Dataset) -> FilterState {
    let known_types: BTreeSet<String> = dataset.cancer_types.iter().cloned().collect();
    FilterState {
        year_min: dataset.bounds.first,
        year_max: dataset.bounds.last,
        selected_types: known_types.clone(),
        metric: dataset.default_metric(),
        show_projection: false,
        bounds: dataset.bounds,
        known_types,
    }
}

impl FilterState {
    /// Move the lower handle. It stops one year short of the upper handle.
    pub fn with_year_min(&self, year: i32) -> Self {
        let lo = self.bounds.first;
        let hi = (self.year_max - 1).max(lo);
        Self {
            year_min: year.clamp(lo, hi),
            ..self.clone()
        }
    }

    /// Move the upper handle. It stops one year past the lower handle.
    pub fn with_year_max(&self, year: i32) -> Self {
        let hi = self.bounds.last;
        let lo = (self.year_min + 1).min(hi);
        Self {
            year_max: year.clamp(lo, hi),
            ..self.clone()
        }
    }

    /// Flip one type in or out of the selection. Unknown names are ignored.
    pub fn with_type_toggled(&self, cancer_type: &str) -> Self {
        let mut next = self.clone();
        if !self.known_types.contains(cancer_type) {
            log::warn!("Ignoring toggle of unknown cancer type '{cancer_type}'");
            return next;
        }
        if !next.selected_types.remove(cancer_type) {
            next.selected_types.insert(cancer_type.to_string());
        }
        next
    }

    /// Replace the selection; names outside the known set are dropped.
    pub fn with_types<I, S>(&self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected_types = types
            .into_iter()
            .filter_map(|t| self.known_types.get(t.as_ref()).cloned())
            .collect();
        Self {
            selected_types,
            ..self.clone()
        }
    }

    pub fn with_all_types(&self) -> Self {
        Self {
            selected_types: self.known_types.clone(),
            ..self.clone()
        }
    }

    pub fn with_no_types(&self) -> Self {
        Self {
            selected_types: BTreeSet::new(),
            ..self.clone()
        }
    }

    pub fn with_metric(&self, metric: Metric) -> Self {
        Self {
            metric,
            ..self.clone()
        }
    }

    pub fn with_projection(&self, show_projection: bool) -> Self {
        Self {
            show_projection,
            ..self.clone()
        }
    }

    /// Whether a row passes the year window and type selection.
    pub fn accepts(&self, record: &Record) -> bool {
        record.year >= self.year_min
            && record.year <= self.year_max
            && self.selected_types.contains(&record.cancer_type)
    }

    /// Selected types paired with their stable color index.
    pub fn indexed_types(&self) -> impl Iterator<Item = (usize, &str)> {
        self.selected_types.iter().map(String::as_str).enumerate()
    }

    pub fn known_types(&self) -> &BTreeSet<String> {
        &self.known_types
    }
}

/// Return the rows that pass the filter, preserving input order.
pub fn filter_records<'a>(records: &'a [Record], filter: &FilterState) -> Vec<&'a Record> {
    records.iter().filter(|r| filter.accepts(r)).collect()
}

/// Case-insensitive substring search over type names, for the type list.
pub fn search_types<'a>(types: &'a [String], query: &str) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();
    types
        .iter()
        .map(String::as_str)
        .filter(|t| needle.is_empty() || t.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::rec;

    fn dataset() -> Dataset {
        let mut records = Vec::new();
        for year in 2000..=2010 {
            for t in ["Breast", "Lung", "Prostate"] {
                records.push(rec(year, t, Metric::AsrWorld, f64::from(year - 2000)));
            }
        }
        Dataset::from_records(records, vec![Metric::AsrWorld]).unwrap()
    }

    #[test]
    fn defaults_select_everything() {
        let ds = dataset();
        let f = init_filter_state(&ds);
        assert_eq!((f.year_min, f.year_max), (2000, 2010));
        assert_eq!(f.selected_types.len(), 3);
        assert_eq!(f.metric, Metric::AsrWorld);
        assert!(!f.show_projection);
        assert_eq!(filter_records(&ds.records, &f).len(), ds.len());
    }

    #[test]
    fn filtered_rows_satisfy_both_predicates() {
        let ds = dataset();
        let f = init_filter_state(&ds)
            .with_year_min(2003)
            .with_year_max(2006)
            .with_type_toggled("Lung");

        let rows = filter_records(&ds.records, &f);
        assert_eq!(rows.len(), 4 * 2);
        assert!(rows.len() <= ds.len());
        for r in &rows {
            assert!((2003..=2006).contains(&r.year));
            assert_ne!(r.cancer_type, "Lung");
            assert!(ds.records.iter().any(|full| full == *r));
        }
        assert!(rows.windows(2).all(|w| w[0].year <= w[1].year));
    }

    #[test]
    fn range_handles_cannot_cross() {
        let ds = dataset();
        let f = init_filter_state(&ds).with_year_max(2004);
        let f = f.with_year_min(2009);
        assert_eq!((f.year_min, f.year_max), (2003, 2004));

        let f = f.with_year_max(1990);
        assert_eq!(f.year_max, 2004);

        let f = init_filter_state(&ds).with_year_min(1900).with_year_max(2100);
        assert_eq!((f.year_min, f.year_max), (2000, 2010));
    }

    #[test]
    fn selection_stays_within_known_types() {
        let ds = dataset();
        let f = init_filter_state(&ds).with_no_types();
        assert!(filter_records(&ds.records, &f).is_empty());

        let f = f.with_type_toggled("Melanoma");
        assert!(f.selected_types.is_empty());

        let f = f.with_types(["Lung", "Liver"]);
        assert_eq!(f.selected_types.iter().collect::<Vec<_>>(), vec!["Lung"]);

        let f = f.with_all_types();
        assert_eq!(f.selected_types.len(), 3);
    }

    #[test]
    fn search_is_case_insensitive() {
        let types = vec![
            "Breast".to_string(),
            "Lung".to_string(),
            "Non-Hodgkin lymphoma".to_string(),
        ];
        assert_eq!(search_types(&types, "LUN"), vec!["Lung"]);
        assert_eq!(search_types(&types, "  "), vec!["Breast", "Lung", "Non-Hodgkin lymphoma"]);
        assert!(search_types(&types, "xyz").is_empty());
    }
}
