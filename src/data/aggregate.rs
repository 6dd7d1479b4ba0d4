use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::error::DataResult;
use super::filter::FilterState;
use super::model::{Dataset, Metric, Record};
use super::regression::{LinearFit, can_project, linear_fit};
use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// Derived series – one per chart, rebuilt on every filter change
// ---------------------------------------------------------------------------

/// Regression segment appended to a trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub fit: LinearFit,
    /// From the first observed year to the end of the horizon.
    pub points: [[f64; 2]; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendLine {
    pub cancer_type: String,
    pub color_index: usize,
    /// `[year, value]`, ascending by year.
    pub points: Vec<[f64; 2]>,
    pub projection: Option<Projection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarEntry {
    pub cancer_type: String,
    pub color_index: usize,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub cancer_type: String,
    pub color_index: usize,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaLayer {
    pub cancer_type: String,
    pub color_index: usize,
    /// One value per entry of [`AreaSeries::years`].
    pub values: Vec<f64>,
}

/// Year-indexed matrix for stacked rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AreaSeries {
    pub years: Vec<i32>,
    pub layers: Vec<AreaLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapLeaf {
    pub cancer_type: String,
    pub color_index: usize,
    pub total_cases: u64,
    pub value: f64,
}

/// Single-year snapshot: leaves sized by case count, colored by metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapSeries {
    pub year: i32,
    pub root_label: String,
    /// Sum of the leaves' case counts.
    pub root_total: u64,
    pub leaves: Vec<TreemapLeaf>,
}

impl TreemapSeries {
    /// Color-scale position of a leaf value. The scale runs from the
    /// root's value of 0 up to the largest leaf value.
    pub fn shade(&self, value: f64) -> f64 {
        let hi = self.leaves.iter().map(|l| l.value).fold(0.0, f64::max);
        if hi <= f64::EPSILON { 0.0 } else { value / hi }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub cancer_type: String,
    pub values: Vec<f64>,
}

/// Type × year grid of metric values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapGrid {
    pub years: Vec<i32>,
    pub rows: Vec<HeatmapRow>,
}

impl HeatmapGrid {
    pub fn max_value(&self) -> f64 {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Everything the charts draw for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSeries {
    pub metric: Metric,
    pub filtered_rows: usize,
    pub trend: Vec<TrendLine>,
    pub bar: Vec<BarEntry>,
    pub pie: Vec<PieSlice>,
    pub area: AreaSeries,
    pub treemap: TreemapSeries,
    pub heatmap: HeatmapGrid,
}

impl DerivedSeries {
    /// Build every chart's series from rows already filtered by `filter`.
    pub fn from_rows(
        dataset: &Dataset,
        filter: &FilterState,
        rows: &[&Record],
        config: &DashboardConfig,
    ) -> DataResult<Self> {
        let metric = dataset.require_metric(filter.metric)?;
        let groups = group_by_type(rows);

        Ok(DerivedSeries {
            metric,
            filtered_rows: rows.len(),
            trend: trend_series(&groups, filter, config.projection_years),
            bar: bar_series(&groups, filter, config.bar_limit),
            pie: pie_series(&groups, filter),
            area: area_series(rows, &groups, filter),
            treemap: treemap_series(dataset, filter, config),
            heatmap: heatmap_series(rows, &groups, filter),
        })
    }
}

// ---------------------------------------------------------------------------
// Aggregators
// ---------------------------------------------------------------------------

/// Filtered rows bucketed by cancer type.
pub type Groups<'a> = BTreeMap<&'a str, Vec<&'a Record>>;

/// Bucket rows by cancer type, keeping each bucket in input order.
pub fn group_by_type<'a>(rows: &[&'a Record]) -> Groups<'a> {
    let mut groups: Groups<'a> = BTreeMap::new();
    for &row in rows {
        groups.entry(row.cancer_type.as_str()).or_default().push(row);
    }
    groups
}

/// Selected types that have at least one filtered row.
fn present<'g, 'a>(
    groups: &'g Groups<'a>,
    filter: &'g FilterState,
) -> impl Iterator<Item = (usize, &'g str, &'g [&'a Record])> {
    filter.indexed_types().filter_map(move |(idx, t)| {
        groups
            .get(t)
            .filter(|g| !g.is_empty())
            .map(|g| (idx, t, g.as_slice()))
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn distinct_years(rows: &[&Record]) -> Vec<i32> {
    rows.iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Value at each year for one type's rows; 0 where the year is absent.
fn values_by_year(group: &[&Record], years: &[i32], metric: Metric) -> Vec<f64> {
    years
        .iter()
        .map(|&y| {
            group
                .iter()
                .find(|r| r.year == y)
                .map_or(0.0, |r| r.value(metric))
        })
        .collect()
}

/// Per selected type, `[year, value]` points with an optional projection.
pub fn trend_series(groups: &Groups<'_>, filter: &FilterState, horizon: i32) -> Vec<TrendLine> {
    present(groups, filter)
        .map(|(color_index, cancer_type, group)| {
            let mut sorted = group.to_vec();
            sorted.sort_by_key(|r| r.year);
            let points: Vec<[f64; 2]> = sorted
                .iter()
                .map(|r| [f64::from(r.year), r.value(filter.metric)])
                .collect();

            let projection = if filter.show_projection {
                project(&points, horizon)
            } else {
                None
            };

            TrendLine {
                cancer_type: cancer_type.to_string(),
                color_index,
                points,
                projection,
            }
        })
        .collect()
}

fn project(points: &[[f64; 2]], horizon: i32) -> Option<Projection> {
    let xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
    let ys: Vec<f64> = points.iter().map(|p| p[1]).collect();
    if !can_project(&xs) {
        return None;
    }
    let fit = linear_fit(&xs, &ys);
    let start = xs[0];
    let end = xs[xs.len() - 1] + f64::from(horizon);
    Some(Projection {
        fit,
        points: [[start, fit.at(start)], [end, fit.at(end)]],
    })
}

/// Mean value per selected type, highest first, at most `limit` entries.
pub fn bar_series(groups: &Groups<'_>, filter: &FilterState, limit: usize) -> Vec<BarEntry> {
    let mut entries: Vec<BarEntry> = present(groups, filter)
        .filter_map(|(color_index, cancer_type, group)| {
            mean(group.iter().map(|r| r.value(filter.metric))).map(|mean| BarEntry {
                cancer_type: cancer_type.to_string(),
                color_index,
                mean,
            })
        })
        .collect();
    // Stable: equal means keep their input order.
    entries.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    entries.truncate(limit);
    entries
}

/// Sum of values per selected type.
pub fn pie_series(groups: &Groups<'_>, filter: &FilterState) -> Vec<PieSlice> {
    present(groups, filter)
        .map(|(color_index, cancer_type, group)| PieSlice {
            cancer_type: cancer_type.to_string(),
            color_index,
            sum: group.iter().map(|r| r.value(filter.metric)).sum(),
        })
        .collect()
}

/// Distinct filtered years × selected types, zero-filled.
pub fn area_series(rows: &[&Record], groups: &Groups<'_>, filter: &FilterState) -> AreaSeries {
    let years = distinct_years(rows);
    let layers = present(groups, filter)
        .map(|(color_index, cancer_type, group)| AreaLayer {
            cancer_type: cancer_type.to_string(),
            color_index,
            values: values_by_year(group, &years, filter.metric),
        })
        .collect();
    AreaSeries { years, layers }
}

/// Snapshot of the configured year, read from the unfiltered rows.
pub fn treemap_series(
    dataset: &Dataset,
    filter: &FilterState,
    config: &DashboardConfig,
) -> TreemapSeries {
    let year = config.snapshot_year;
    let leaves: Vec<TreemapLeaf> = filter
        .indexed_types()
        .filter_map(|(color_index, cancer_type)| {
            let entry = dataset.find(cancer_type, year)?;
            Some(TreemapLeaf {
                cancer_type: cancer_type.to_string(),
                color_index,
                total_cases: entry.total_or_zero(),
                value: entry.value(filter.metric),
            })
        })
        .collect();

    TreemapSeries {
        year,
        root_label: config.root_label.clone(),
        root_total: leaves.iter().map(|l| l.total_cases).sum(),
        leaves,
    }
}

/// One row per selected type over the filtered years, zero-filled.
pub fn heatmap_series(rows: &[&Record], groups: &Groups<'_>, filter: &FilterState) -> HeatmapGrid {
    let years = distinct_years(rows);
    let rows = filter
        .indexed_types()
        .map(|(_, cancer_type)| HeatmapRow {
            cancer_type: cancer_type.to_string(),
            values: groups
                .get(cancer_type)
                .map(|g| values_by_year(g, &years, filter.metric))
                .unwrap_or_else(|| vec![0.0; years.len()]),
        })
        .collect();
    HeatmapGrid { years, rows }
}
