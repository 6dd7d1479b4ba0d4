use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::{DataError, DataResult};

/// Header of the year column.
pub const YEAR_COLUMN: &str = "Year";
/// Header of the categorical cancer-type column.
pub const LABEL_COLUMN: &str = "Cancer label";
/// Header of the absolute case-count column.
pub const TOTAL_COLUMN: &str = "Total";

// ---------------------------------------------------------------------------
// CellValue – a single parsed cell, typed per cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as inferred from the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Infer a typed value from raw cell text: integer, float, bool, text.
    pub fn infer(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::Text(s.to_string())
    }

    /// Numeric view of the cell, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Whole-number view of the cell (`2020` and `2020.0` both qualify).
    pub fn as_whole(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Metric – the closed set of selectable numeric columns
// ---------------------------------------------------------------------------

/// A numeric column that can drive the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Metric {
    #[serde(rename = "ASR (World)")]
    AsrWorld,
    #[serde(rename = "Crude rate")]
    CrudeRate,
    #[serde(rename = "Cumulative risk")]
    CumulativeRisk,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::AsrWorld, Metric::CrudeRate, Metric::CumulativeRisk];

    /// Header text of the column backing this metric.
    pub fn column_name(self) -> &'static str {
        match self {
            Metric::AsrWorld => "ASR (World)",
            Metric::CrudeRate => "Crude rate",
            Metric::CumulativeRisk => "Cumulative risk",
        }
    }

    /// Resolve an exact header name.
    pub fn from_column(header: &str) -> Option<Metric> {
        Metric::ALL
            .into_iter()
            .find(|m| m.column_name() == header.trim())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Metric {
    type Err = DataError;

    /// Accepts the column header (any case) or a short alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        let by_alias = match needle.as_str() {
            "asr" | "asr-world" => Some(Metric::AsrWorld),
            "crude" | "crude-rate" => Some(Metric::CrudeRate),
            "risk" | "cumulative-risk" => Some(Metric::CumulativeRisk),
            _ => None,
        };
        by_alias
            .or_else(|| {
                Metric::ALL
                    .into_iter()
                    .find(|m| m.column_name().to_ascii_lowercase() == needle)
            })
            .ok_or_else(|| DataError::UnknownMetric(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One dataset row: a (year, cancer type) observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub year: i32,
    pub cancer_type: String,
    /// Absolute case count, if the row carries one.
    pub total: Option<u64>,
    /// Metric values present on this row; blank cells are absent.
    pub metrics: BTreeMap<Metric, f64>,
}

impl Record {
    /// Metric value, reading a blank cell as `0.0`.
    pub fn value(&self, metric: Metric) -> f64 {
        self.metrics.get(&metric).copied().unwrap_or(0.0)
    }

    pub fn total_or_zero(&self) -> u64 {
        self.total.unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Inclusive year span covered by the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearBounds {
    pub first: i32,
    pub last: i32,
}

/// The full parsed dataset with pre-computed indices.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All rows, ascending by year (stable within a year).
    pub records: Vec<Record>,
    /// Sorted distinct cancer types.
    pub cancer_types: Vec<String>,
    /// Metric columns present in the header, in enumeration order.
    pub metrics: Vec<Metric>,
    pub bounds: YearBounds,
}

impl Dataset {
    /// Sort rows by year and build the type index.
    pub fn from_records(mut records: Vec<Record>, metrics: Vec<Metric>) -> DataResult<Self> {
        if metrics.is_empty() {
            return Err(DataError::NoMetricColumns {
                expected: expected_metric_list(),
            });
        }
        records.sort_by_key(|r| r.year);

        let (first, last) = match (records.first(), records.last()) {
            (Some(a), Some(b)) => (a.year, b.year),
            _ => return Err(DataError::NoRecords),
        };

        let cancer_types: Vec<String> = records
            .iter()
            .map(|r| r.cancer_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut metrics = metrics;
        metrics.sort();
        metrics.dedup();

        Ok(Dataset {
            records,
            cancer_types,
            metrics,
            bounds: YearBounds { first, last },
        })
    }

    /// Ensure the dataset carries `metric`.
    pub fn require_metric(&self, metric: Metric) -> DataResult<Metric> {
        if self.metrics.contains(&metric) {
            Ok(metric)
        } else {
            Err(DataError::UnknownMetric(metric.column_name().to_string()))
        }
    }

    /// `ASR (World)` when present, otherwise the first discovered metric.
    pub fn default_metric(&self) -> Metric {
        if self.metrics.contains(&Metric::AsrWorld) {
            Metric::AsrWorld
        } else {
            self.metrics[0]
        }
    }

    /// First row for a (type, year) pair, ignoring any filter.
    pub fn find(&self, cancer_type: &str, year: i32) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.year == year && r.cancer_type == cancer_type)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

pub(crate) fn expected_metric_list() -> String {
    Metric::ALL
        .iter()
        .map(|m| m.column_name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a record carrying a single metric value.
    pub(crate) fn rec(year: i32, cancer_type: &str, metric: Metric, value: f64) -> Record {
        Record {
            year,
            cancer_type: cancer_type.to_string(),
            total: None,
            metrics: BTreeMap::from([(metric, value)]),
        }
    }

    #[test]
    fn infers_cell_types() {
        assert_eq!(CellValue::infer("2020"), CellValue::Integer(2020));
        assert_eq!(CellValue::infer(" 4.5 "), CellValue::Float(4.5));
        assert_eq!(CellValue::infer("true"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("Lung"), CellValue::Text("Lung".into()));
        assert!(CellValue::infer("   ").is_null());
        assert_eq!(CellValue::infer("2021.0").as_whole(), Some(2021));
        assert_eq!(CellValue::infer("2021.5").as_whole(), None);
    }

    #[test]
    fn metric_parses_headers_and_aliases() {
        assert_eq!("ASR (World)".parse::<Metric>().unwrap(), Metric::AsrWorld);
        assert_eq!("crude rate".parse::<Metric>().unwrap(), Metric::CrudeRate);
        assert_eq!("risk".parse::<Metric>().unwrap(), Metric::CumulativeRisk);
        assert!(matches!(
            "Median age".parse::<Metric>(),
            Err(DataError::UnknownMetric(_))
        ));
        assert_eq!(Metric::from_column("Crude rate"), Some(Metric::CrudeRate));
        assert_eq!(Metric::from_column("Total"), None);
    }

    #[test]
    fn dataset_sorts_by_year_and_indexes_types() {
        let ds = Dataset::from_records(
            vec![
                rec(2023, "Lung", Metric::AsrWorld, 1.0),
                rec(2020, "Breast", Metric::AsrWorld, 2.0),
                rec(2021, "Lung", Metric::AsrWorld, 3.0),
            ],
            vec![Metric::AsrWorld],
        )
        .unwrap();

        let years: Vec<i32> = ds.records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2020, 2021, 2023]);
        assert_eq!(ds.cancer_types, vec!["Breast", "Lung"]);
        assert_eq!(ds.bounds, YearBounds { first: 2020, last: 2023 });
        assert!(ds.find("Lung", 2023).is_some());
        assert!(ds.find("Breast", 2023).is_none());
    }

    #[test]
    fn unknown_metric_is_reported() {
        let ds = Dataset::from_records(
            vec![rec(2020, "Lung", Metric::CrudeRate, 1.0)],
            vec![Metric::CrudeRate],
        )
        .unwrap();
        assert_eq!(ds.default_metric(), Metric::CrudeRate);
        assert!(matches!(
            ds.require_metric(Metric::AsrWorld),
            Err(DataError::UnknownMetric(name)) if name == "ASR (World)"
        ));
    }

    #[test]
    fn empty_inputs_are_load_failures() {
        assert!(matches!(
            Dataset::from_records(Vec::new(), vec![Metric::AsrWorld]),
            Err(DataError::NoRecords)
        ));
        assert!(matches!(
            Dataset::from_records(vec![rec(2020, "Lung", Metric::AsrWorld, 1.0)], Vec::new()),
            Err(DataError::NoMetricColumns { .. })
        ));
    }
}
