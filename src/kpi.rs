use std::collections::HashMap;

use serde::Serialize;

use crate::data::model::{Metric, Record};

/// Headline figures for the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub metric: Metric,
    /// Mean of the metric over every filtered row.
    pub avg_rate: f64,
    /// Type with the highest positive mean, if any.
    pub top_type: Option<String>,
    /// Mean of `top_type`, or 0 when no type qualified.
    pub top_value: f64,
}

impl Kpis {
    pub fn avg_label(&self) -> String {
        format!("{:.2}", self.avg_rate)
    }

    pub fn top_type_label(&self) -> &str {
        self.top_type.as_deref().unwrap_or("")
    }

    pub fn top_value_label(&self) -> String {
        format!("{:.2} ({})", self.top_value, self.metric)
    }
}

/// Compute the KPIs, or `None` for an empty selection so the caller can
/// keep showing the previous figures.
///
/// Groups are scanned in the order their type first appears in `rows`.
/// A group replaces the running leader only when its mean is strictly
/// greater, so ties go to the earlier group, and the leader starts at 0:
/// a type whose mean is zero or negative never becomes `top_type`.
pub fn compute_kpis(rows: &[&Record], metric: Metric) -> Option<Kpis> {
    if rows.is_empty() {
        return None;
    }

    let total: f64 = rows.iter().map(|r| r.value(metric)).sum();
    let avg_rate = total / rows.len() as f64;

    // (type, sum, count) in first-seen order
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let slot = *index.entry(row.cancer_type.as_str()).or_insert_with(|| {
            groups.push((row.cancer_type.as_str(), 0.0, 0));
            groups.len() - 1
        });
        groups[slot].1 += row.value(metric);
        groups[slot].2 += 1;
    }

    let mut top_type = None;
    let mut top_value = 0.0;
    for (cancer_type, sum, count) in groups {
        let mean = sum / count as f64;
        if mean > top_value {
            top_value = mean;
            top_type = Some(cancer_type.to_string());
        }
    }

    Some(Kpis {
        metric,
        avg_rate,
        top_type,
        top_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::rec;

    fn refs(records: &[Record]) -> Vec<&Record> {
        records.iter().collect()
    }

    #[test]
    fn empty_rows_leave_kpis_unset() {
        assert!(compute_kpis(&[], Metric::AsrWorld).is_none());
    }

    #[test]
    fn averages_and_picks_highest_mean() {
        let records = vec![
            rec(2020, "Lung", Metric::AsrWorld, 40.0),
            rec(2023, "Breast", Metric::AsrWorld, 30.0),
            rec(2023, "Lung", Metric::AsrWorld, 45.0),
        ];
        let kpis = compute_kpis(&refs(&records), Metric::AsrWorld).unwrap();
        assert_eq!(kpis.avg_label(), "38.33");
        assert_eq!(kpis.top_type.as_deref(), Some("Lung"));
        assert_eq!(kpis.top_value, 42.5);
        assert_eq!(kpis.top_value_label(), "42.50 (ASR (World))");
    }

    #[test]
    fn ties_go_to_first_encountered_type() {
        let records = vec![
            rec(2020, "B", Metric::AsrWorld, 5.0),
            rec(2020, "A", Metric::AsrWorld, 5.0),
        ];
        let kpis = compute_kpis(&refs(&records), Metric::AsrWorld).unwrap();
        assert_eq!(kpis.top_type.as_deref(), Some("B"));

        let records = vec![
            rec(2020, "A", Metric::AsrWorld, 4.0),
            rec(2020, "B", Metric::AsrWorld, 5.0),
            rec(2021, "A", Metric::AsrWorld, 6.0),
        ];
        let kpis = compute_kpis(&refs(&records), Metric::AsrWorld).unwrap();
        assert_eq!(kpis.top_type.as_deref(), Some("A"));
    }

    #[test]
    fn non_positive_means_never_lead() {
        let records = vec![
            rec(2020, "A", Metric::AsrWorld, -1.0),
            rec(2020, "B", Metric::AsrWorld, -3.0),
            rec(2020, "C", Metric::AsrWorld, 0.0),
        ];
        let kpis = compute_kpis(&refs(&records), Metric::AsrWorld).unwrap();
        assert!(kpis.top_type.is_none());
        assert_eq!(kpis.top_type_label(), "");
        assert_eq!(kpis.top_value, 0.0);
        assert!((kpis.avg_rate + 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn blank_metric_cells_count_as_zero() {
        let records = vec![
            rec(2020, "A", Metric::CrudeRate, 9.0),
            rec(2020, "A", Metric::AsrWorld, 4.0),
        ];
        let kpis = compute_kpis(&refs(&records), Metric::AsrWorld).unwrap();
        assert_eq!(kpis.avg_rate, 2.0);
        assert_eq!(kpis.top_value, 2.0);
    }
}
