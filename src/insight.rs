use std::fmt;

use serde::Serialize;

use crate::data::filter::FilterState;
use crate::kpi::Kpis;

/// Identity of a chart card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChartId {
    Trend,
    Bar,
    Pie,
    Area,
    Treemap,
    Heatmap,
}

impl ChartId {
    pub const ALL: [ChartId; 6] = [
        ChartId::Trend,
        ChartId::Bar,
        ChartId::Pie,
        ChartId::Area,
        ChartId::Treemap,
        ChartId::Heatmap,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartId::Trend => "Trend over time",
            ChartId::Bar => "Average by cancer type",
            ChartId::Pie => "Share of total",
            ChartId::Area => "Cumulative burden",
            ChartId::Treemap => "Snapshot severity",
            ChartId::Heatmap => "Type × year intensity",
        }
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Descriptive text shown under an expanded chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub chart: ChartId,
    pub title: String,
    pub body: String,
}

const UNSET: &str = "n/a";

/// Fill the chart's template with the year window, the projection
/// horizon in years and the current KPIs.
pub fn describe(
    chart: ChartId,
    filter: &FilterState,
    kpis: Option<&Kpis>,
    horizon: i32,
) -> Insight {
    let (from, to) = (filter.year_min, filter.year_max);
    let ahead = if horizon == 1 {
        "one year".to_string()
    } else {
        format!("{horizon} years")
    };
    let metric = filter.metric;
    let top_type = kpis
        .and_then(|k| k.top_type.as_deref())
        .unwrap_or(UNSET);
    let top_value = kpis.map_or_else(|| UNSET.to_string(), Kpis::top_value_label);

    let (title, body) = match chart {
        ChartId::Trend => (
            "Longitudinal trend analysis".to_string(),
            format!(
                "Rates are traced year by year from {from} to {to}. Dotted segments, when \
                 enabled, extend each series {ahead} ahead along its least-squares line. \
                 {top_type} shows the highest average over the window at {top_value}. \
                 Whether a projection rises or falls depends on the individual cancer site."
            ),
        ),
        ChartId::Bar => (
            "Comparative ranking".to_string(),
            format!(
                "Bars rank the mean {metric} of each selected cancer type between {from} \
                 and {to}. {top_type} leads the ranking at {top_value}. The gap between the \
                 highest and lowest bars points to differences in risk factors and in \
                 treatment outcomes across sites."
            ),
        ),
        ChartId::Pie => (
            "Proportional distribution".to_string(),
            format!(
                "Each slice is the summed {metric} of one cancer type from {from} to {to}, \
                 shown as a share of the selection. {top_type} accounts for one of the \
                 largest portions, which marks it as a priority for targeted intervention."
            ),
        ),
        ChartId::Area => (
            "Cumulative burden".to_string(),
            format!(
                "Stacked layers accumulate the {metric} of every selected type from {from} \
                 to {to}. A growing band height reflects rising combined burden, whether \
                 from population growth or from changes in individual rates. This view \
                 supports planning of overall resources."
            ),
        ),
        ChartId::Treemap => (
            "Cross-sectional severity snapshot".to_string(),
            format!(
                "This view is pinned to a single year and ignores the {from}–{to} window. \
                 Box size follows the absolute number of cases while color intensity \
                 follows {metric}. High-volume cancers are not always the most severe per \
                 capita, and the reverse also holds."
            ),
        ),
        ChartId::Heatmap => (
            "Intensity matrix".to_string(),
            format!(
                "Each cell shows the {metric} of one cancer type in one year between {from} \
                 and {to}; darker cells are higher. Blank years read as zero. {top_type} \
                 carries the strongest average intensity at {top_value}."
            ),
        ),
    };

    Insight { chart, title, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::init_filter_state;
    use crate::data::model::{Dataset, Metric, tests::rec};

    fn filter() -> FilterState {
        let ds = Dataset::from_records(
            vec![
                rec(2000, "Lung", Metric::AsrWorld, 1.0),
                rec(2023, "Lung", Metric::AsrWorld, 2.0),
            ],
            vec![Metric::AsrWorld],
        )
        .unwrap();
        init_filter_state(&ds).with_year_min(2005)
    }

    #[test]
    fn interpolates_window_and_kpis() {
        let kpis = Kpis {
            metric: Metric::AsrWorld,
            avg_rate: 3.0,
            top_type: Some("Lung".into()),
            top_value: 42.5,
        };
        let insight = describe(ChartId::Trend, &filter(), Some(&kpis), 5);
        assert_eq!(insight.chart, ChartId::Trend);
        assert!(insight.body.contains("from 2005 to 2023"));
        assert!(insight.body.contains("Lung"));
        assert!(insight.body.contains("42.50 (ASR (World))"));
        assert!(insight.body.contains("5 years ahead"));
    }

    #[test]
    fn trend_text_follows_projection_horizon() {
        let body = describe(ChartId::Trend, &filter(), None, 10).body;
        assert!(body.contains("10 years ahead"));
        let body = describe(ChartId::Trend, &filter(), None, 1).body;
        assert!(body.contains("one year ahead"));
    }

    #[test]
    fn missing_kpis_render_placeholder() {
        let insight = describe(ChartId::Bar, &filter(), None, 5);
        assert!(insight.body.contains("n/a leads the ranking at n/a"));
    }

    #[test]
    fn every_chart_has_distinct_text() {
        let f = filter();
        let bodies: std::collections::HashSet<String> = ChartId::ALL
            .iter()
            .map(|&c| describe(c, &f, None, 5).body)
            .collect();
        assert_eq!(bodies.len(), ChartId::ALL.len());
    }
}
