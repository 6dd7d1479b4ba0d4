use std::path::PathBuf;

use crate::config::DashboardConfig;
use crate::data::aggregate::DerivedSeries;
use crate::data::filter::{FilterState, filter_records, init_filter_state, search_types};
use crate::data::model::{Dataset, Metric};
use crate::insight::{ChartId, Insight, describe};
use crate::kpi::{Kpis, compute_kpis};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until loading succeeds).
    pub dataset: Option<Dataset>,

    /// Current selection; present whenever `dataset` is.
    pub filters: Option<FilterState>,

    /// Series for every chart, rebuilt on each filter change.
    pub derived: Option<DerivedSeries>,

    /// Last non-empty KPI figures. An empty selection keeps the old ones.
    pub kpis: Option<Kpis>,

    /// Text typed into the cancer-type search box.
    pub type_search: String,

    /// Chart currently shown full-size, if any.
    pub expanded: Option<ChartId>,

    /// Descriptive text for the expanded chart.
    pub insight: Option<Insight>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    /// Blocking error: the dashboard shows nothing else while set.
    pub fatal_error: Option<String>,

    /// Where the next viewport screenshot should be written.
    pub pending_screenshot: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            filters: None,
            derived: None,
            kpis: None,
            type_search: String::new(),
            expanded: None,
            insight: None,
            status_message: None,
            fatal_error: None,
            pending_screenshot: None,
        }
    }

    /// Ingest a newly loaded dataset: reset filters and recompute.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = Some(init_filter_state(&dataset));
        self.dataset = Some(dataset);
        self.kpis = None;
        self.status_message = None;
        self.fatal_error = None;
        self.recompute();
    }

    /// Record a load failure that leaves the dashboard without data.
    pub fn set_fatal(&mut self, message: String) {
        self.dataset = None;
        self.filters = None;
        self.derived = None;
        self.kpis = None;
        self.fatal_error = Some(message);
    }

    /// Replace the filter state and recompute if anything changed.
    pub fn apply(&mut self, next: FilterState) {
        if self.filters.as_ref() == Some(&next) {
            return;
        }
        self.filters = Some(next);
        self.recompute();
    }

    /// Derive a new filter state from the current one and apply it.
    pub fn update_filter(&mut self, change: impl FnOnce(&FilterState) -> FilterState) {
        if let Some(current) = &self.filters {
            let next = change(current);
            self.apply(next);
        }
    }

    /// Run the whole pipeline for the current filter state.
    pub fn recompute(&mut self) {
        let (Some(ds), Some(filter)) = (&self.dataset, &self.filters) else {
            return;
        };

        let rows = filter_records(&ds.records, filter);
        log::debug!(
            "Recomputing: {} of {} rows pass ({}–{}, {} types, {})",
            rows.len(),
            ds.len(),
            filter.year_min,
            filter.year_max,
            filter.selected_types.len(),
            filter.metric
        );

        match DerivedSeries::from_rows(ds, filter, &rows, &self.config) {
            Ok(derived) => {
                self.derived = Some(derived);
                self.status_message = None;
                if let Some(kpis) = compute_kpis(&rows, filter.metric) {
                    self.kpis = Some(kpis);
                }
            }
            Err(e) => {
                log::warn!("Cannot derive chart series: {e}");
                self.derived = None;
                self.status_message = Some(e.to_string());
            }
        }

        if let Some(chart) = self.expanded {
            self.insight = Some(describe(
                chart,
                filter,
                self.kpis.as_ref(),
                self.config.projection_years,
            ));
        }
    }

    // -- Filter transitions --

    pub fn toggle_type(&mut self, cancer_type: &str) {
        self.update_filter(|f| f.with_type_toggled(cancer_type));
    }

    pub fn select_all(&mut self) {
        self.update_filter(FilterState::with_all_types);
    }

    pub fn select_none(&mut self) {
        self.update_filter(FilterState::with_no_types);
    }

    pub fn set_year_min(&mut self, year: i32) {
        self.update_filter(|f| f.with_year_min(year));
    }

    pub fn set_year_max(&mut self, year: i32) {
        self.update_filter(|f| f.with_year_max(year));
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.update_filter(|f| f.with_metric(metric));
    }

    pub fn set_projection(&mut self, show: bool) {
        self.update_filter(|f| f.with_projection(show));
    }

    // -- Layout --

    /// Expand `chart` (collapsing any other), or collapse it if it is
    /// already expanded. Expanding regenerates the chart's insight.
    pub fn toggle_expand(&mut self, chart: ChartId) {
        if self.expanded == Some(chart) {
            self.expanded = None;
            self.insight = None;
            return;
        }
        self.expanded = Some(chart);
        self.insight = self
            .filters
            .as_ref()
            .map(|f| describe(chart, f, self.kpis.as_ref(), self.config.projection_years));
    }

    /// Type names matching the search box.
    pub fn visible_types(&self) -> Vec<String> {
        self.dataset
            .as_ref()
            .map(|ds| {
                search_types(&ds.cancer_types, &self.type_search)
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, tests::rec};

    fn loaded() -> AppState {
        let records: Vec<Record> = vec![
            Record { total: Some(100), ..rec(2020, "Lung", Metric::AsrWorld, 40.0) },
            Record { total: Some(120), ..rec(2023, "Lung", Metric::AsrWorld, 45.0) },
            Record { total: Some(200), ..rec(2023, "Breast", Metric::AsrWorld, 30.0) },
        ];
        let ds = Dataset::from_records(records, vec![Metric::AsrWorld]).unwrap();
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(ds);
        state
    }

    #[test]
    fn loading_computes_everything() {
        let state = loaded();
        let derived = state.derived.as_ref().unwrap();
        assert_eq!(derived.filtered_rows, 3);
        let kpis = state.kpis.as_ref().unwrap();
        assert_eq!(kpis.avg_label(), "38.33");
        assert_eq!(kpis.top_type.as_deref(), Some("Lung"));
        assert_eq!(derived.treemap.leaves.len(), 2);
    }

    #[test]
    fn empty_selection_keeps_previous_kpis() {
        let mut state = loaded();
        let before = state.kpis.clone();
        state.select_none();
        assert_eq!(state.derived.as_ref().unwrap().filtered_rows, 0);
        assert_eq!(state.kpis, before);

        state.toggle_type("Breast");
        assert_eq!(state.kpis.as_ref().unwrap().top_type.as_deref(), Some("Breast"));
    }

    #[test]
    fn expand_toggles_and_refreshes_insight() {
        let mut state = loaded();
        state.toggle_expand(ChartId::Bar);
        assert_eq!(state.expanded, Some(ChartId::Bar));
        assert!(state.insight.as_ref().unwrap().body.contains("Lung"));

        state.toggle_expand(ChartId::Pie);
        assert_eq!(state.insight.as_ref().unwrap().chart, ChartId::Pie);

        state.set_year_min(2021);
        assert!(state.insight.as_ref().unwrap().body.contains("2021"));

        state.toggle_expand(ChartId::Pie);
        assert!(state.expanded.is_none() && state.insight.is_none());
    }

    #[test]
    fn last_write_wins() {
        let mut state = loaded();
        state.set_projection(true);
        state.set_metric(Metric::AsrWorld);
        state.set_year_max(2021);
        state.set_year_max(2022);
        let f = state.filters.as_ref().unwrap();
        assert_eq!(f.year_max, 2022);
        assert!(f.show_projection);
    }

    #[test]
    fn unknown_metric_surfaces_as_status() {
        let mut state = loaded();
        state.set_metric(Metric::CrudeRate);
        assert!(state.derived.is_none());
        assert!(state.status_message.as_deref().unwrap().contains("unknown metric"));
    }

    #[test]
    fn search_narrows_visible_types() {
        let mut state = loaded();
        state.type_search = "bre".into();
        assert_eq!(state.visible_types(), vec!["Breast"]);
    }
}
