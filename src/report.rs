use std::fmt;

use anyhow::{Context, Result};

use crate::cli::CliArgs;
use crate::config::DashboardConfig;
use crate::data::aggregate::DerivedSeries;
use crate::data::filter::{FilterState, filter_records, init_filter_state};
use crate::data::model::{Dataset, Metric};
use crate::export::Snapshot;
use crate::insight::{ChartId, describe};
use crate::kpi::{Kpis, compute_kpis};
use crate::ui::plot::format_count;

/// Build the filter selected on the command line, starting from the
/// dataset defaults.
pub fn filter_from_args(dataset: &Dataset, args: &CliArgs) -> Result<FilterState> {
    let mut filter = init_filter_state(dataset);

    if let Some(name) = &args.metric {
        let metric: Metric = name.parse()?;
        filter = filter.with_metric(dataset.require_metric(metric)?);
    }
    if let Some(year) = args.year_min {
        filter = filter.with_year_min(year);
    }
    if let Some(year) = args.year_max {
        filter = filter.with_year_max(year);
    }
    if !args.types.is_empty() {
        for name in &args.types {
            if !filter.known_types().contains(name) {
                log::warn!("Ignoring unknown cancer type '{name}'");
            }
        }
        filter = filter.with_types(&args.types);
    }
    Ok(filter.with_projection(args.projection))
}

/// Everything a report needs, computed once.
pub struct Report {
    pub filter: FilterState,
    pub kpis: Option<Kpis>,
    pub derived: DerivedSeries,
    /// Projection horizon in years, for the insight text.
    pub horizon: i32,
}

impl Report {
    pub fn build(dataset: &Dataset, filter: FilterState, config: &DashboardConfig) -> Result<Self> {
        let rows = filter_records(&dataset.records, &filter);
        let derived = DerivedSeries::from_rows(dataset, &filter, &rows, config)
            .context("deriving chart series")?;
        let kpis = compute_kpis(&rows, filter.metric);
        Ok(Self {
            filter,
            kpis,
            derived,
            horizon: config.projection_years,
        })
    }

    pub fn render_json(&self) -> Result<String> {
        Snapshot::new(&self.filter, self.kpis.as_ref(), &self.derived, self.horizon).to_json()
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let f = &self.filter;
        let d = &self.derived;

        writeln!(out, "Cancer statistics, {}–{}", f.year_min, f.year_max)?;
        writeln!(
            out,
            "Metric: {}   Types: {}/{}   Rows: {}",
            f.metric,
            f.selected_types.len(),
            f.known_types().len(),
            d.filtered_rows
        )?;

        writeln!(out, "\nKey figures")?;
        match &self.kpis {
            Some(k) => {
                writeln!(out, "  Average rate  {}", k.avg_label())?;
                writeln!(out, "  Highest type  {}", k.top_type.as_deref().unwrap_or("none"))?;
                writeln!(out, "  Highest rate  {}", k.top_value_label())?;
            }
            None => writeln!(out, "  no rows selected")?,
        }

        writeln!(out, "\nRanking by mean")?;
        for (rank, entry) in d.bar.iter().enumerate() {
            writeln!(out, "  {:>2}. {:<40} {:>10.2}", rank + 1, entry.cancer_type, entry.mean)?;
        }

        let tm = &d.treemap;
        writeln!(
            out,
            "\n{} snapshot: {} ({} cases)",
            tm.year,
            tm.root_label,
            format_count(tm.root_total)
        )?;
        for leaf in &tm.leaves {
            writeln!(
                out,
                "  {:<40} {:>10} cases {:>10.2}",
                leaf.cancer_type,
                format_count(leaf.total_cases),
                leaf.value
            )?;
        }

        for chart in ChartId::ALL {
            let insight = describe(chart, f, self.kpis.as_ref(), self.horizon);
            writeln!(out, "\n{}\n  {}", insight.title, insight.body)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_embedded;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["onco-dash", "--headless"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn args_shape_the_filter() {
        let ds = load_embedded().unwrap();
        let filter = filter_from_args(
            &ds,
            &args(&["--metric", "crude", "--from", "2010", "--to", "2015", "--types", "Lung,Nope"]),
        )
        .unwrap();
        assert_eq!(filter.metric, Metric::CrudeRate);
        assert_eq!((filter.year_min, filter.year_max), (2010, 2015));
        assert_eq!(filter.selected_types.len(), 1);
        assert!(filter.selected_types.contains("Lung"));
        assert!(!filter.show_projection);
    }

    #[test]
    fn bad_metric_is_an_error() {
        let ds = load_embedded().unwrap();
        assert!(filter_from_args(&ds, &args(&["--metric", "mortality"])).is_err());
    }

    #[test]
    fn text_report_lists_every_section() {
        let ds = load_embedded().unwrap();
        let filter = filter_from_args(&ds, &args(&[])).unwrap();
        let report = Report::build(&ds, filter, &DashboardConfig::default()).unwrap();
        let text = report.render_text();
        assert!(text.contains("Key figures"));
        assert!(text.contains("Ranking by mean"));
        assert!(text.contains("2023 snapshot: All Cancers"));
        let total = format_count(report.derived.treemap.root_total);
        assert!(total.contains(','));
        assert!(text.contains(&format!("({total} cases)")));
        for chart in ChartId::ALL {
            let insight = describe(chart, &report.filter, report.kpis.as_ref(), report.horizon);
            assert!(text.contains(&insight.title), "missing {chart}");
        }
    }

    #[test]
    fn empty_selection_still_reports() {
        let ds = load_embedded().unwrap();
        let filter = init_filter_state(&ds).with_no_types();
        let report = Report::build(&ds, filter, &DashboardConfig::default()).unwrap();
        assert!(report.kpis.is_none());
        assert!(report.render_text().contains("no rows selected"));

        let json: serde_json::Value = serde_json::from_str(&report.render_json().unwrap()).unwrap();
        assert!(json["kpis"].is_null());
        assert_eq!(json["derived"]["filtered_rows"], 0);
    }
}
