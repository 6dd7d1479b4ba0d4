use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;

use super::error::{DataError, DataResult};
use super::model::{
    CellValue, Dataset, LABEL_COLUMN, Metric, Record, TOTAL_COLUMN, YEAR_COLUMN,
};

/// The dataset compiled into the binary.
pub const EMBEDDED_CSV: &str = include_str!("../../data/cancer_australia.csv");

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse the embedded dataset.
pub fn load_embedded() -> DataResult<Dataset> {
    parse_csv_str(EMBEDDED_CSV)
}

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with `Year`, `Cancer label` and metric columns
/// * `.json` – `[{ "Year": 2020, "Cancer label": "Lung", ... }, ...]`
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            parse_csv(file)
        }
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_json_str(&text)
        }
        other => Err(DataError::UnsupportedExtension(other.to_string())),
    };
    dataset.with_context(|| format!("loading dataset from {}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse CSV text whose first row holds the column headers.
pub fn parse_csv_str(text: &str) -> DataResult<Dataset> {
    parse_csv(text.trim().as_bytes())
}

fn parse_csv<R: Read>(source: R) -> DataResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(CellValue::infer).collect::<Vec<_>>());
    }

    assemble(&headers, rows)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "Year": 2020, "Cancer label": "Lung", "Total": 100, "ASR (World)": 40.0 },
///   ...
/// ]
/// ```
pub fn parse_json_str(text: &str) -> DataResult<Dataset> {
    let root: JsonValue = serde_json::from_str(text)?;
    let objects = root
        .as_array()
        .ok_or_else(|| DataError::JsonShape("expected a top-level array".into()))?;

    // Column order follows first appearance across all objects.
    let mut headers: Vec<String> = Vec::new();
    for (i, item) in objects.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| DataError::JsonShape(format!("row {i} is not an object")))?;
        for key in obj.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .filter_map(|item| item.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    assemble(&headers, rows)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::infer(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Shared row assembly
// ---------------------------------------------------------------------------

static NULL_CELL: CellValue = CellValue::Null;

/// Column positions resolved from the header row.
struct ColumnLayout {
    year: usize,
    label: usize,
    total: Option<usize>,
    metrics: Vec<(usize, Metric)>,
}

impl ColumnLayout {
    fn resolve(headers: &[String]) -> DataResult<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let year = position(YEAR_COLUMN).ok_or(DataError::MissingColumn(YEAR_COLUMN))?;
        let label = position(LABEL_COLUMN).ok_or(DataError::MissingColumn(LABEL_COLUMN))?;
        let total = position(TOTAL_COLUMN);

        let mut metrics = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if idx == year || idx == label || Some(idx) == total {
                continue;
            }
            match Metric::from_column(header) {
                Some(metric) => metrics.push((idx, metric)),
                None => log::debug!("Ignoring column '{header}'"),
            }
        }

        if metrics.is_empty() {
            return Err(DataError::NoMetricColumns {
                expected: super::model::expected_metric_list(),
            });
        }

        Ok(ColumnLayout {
            year,
            label,
            total,
            metrics,
        })
    }

    /// Build a record, or `None` when year or label is missing.
    fn record(&self, cells: &[CellValue]) -> Option<Record> {
        let cell = |idx: usize| cells.get(idx).unwrap_or(&NULL_CELL);

        let year = cell(self.year)
            .as_whole()
            .and_then(|y| i32::try_from(y).ok())?;
        let label = cell(self.label);
        if label.is_null() {
            return None;
        }
        let cancer_type = label.to_string();
        if cancer_type.is_empty() {
            return None;
        }

        let total = self
            .total
            .and_then(|idx| cell(idx).as_whole())
            .and_then(|t| u64::try_from(t).ok());

        let metrics: BTreeMap<Metric, f64> = self
            .metrics
            .iter()
            .filter_map(|&(idx, metric)| cell(idx).as_f64().map(|v| (metric, v)))
            .collect();

        Some(Record {
            year,
            cancer_type,
            total,
            metrics,
        })
    }
}

fn assemble(headers: &[String], rows: Vec<Vec<CellValue>>) -> DataResult<Dataset> {
    let layout = ColumnLayout::resolve(headers)?;

    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for (row_no, cells) in rows.iter().enumerate() {
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        match layout.record(cells) {
            Some(record) => records.push(record),
            None => {
                dropped += 1;
                log::debug!("Dropping row {row_no}: missing year or cancer label");
            }
        }
    }
    if dropped > 0 {
        log::info!("Dropped {dropped} incomplete rows");
    }

    let metrics = layout.metrics.iter().map(|&(_, m)| m).collect();
    Dataset::from_records(records, metrics)
}
