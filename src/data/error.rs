use thiserror::Error;

/// Result type for dataset loading and pipeline operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors raised while loading the dataset or resolving a metric.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required column is absent from the header row.
    #[error("dataset is missing the '{0}' column")]
    MissingColumn(&'static str),

    /// The header row names none of the known metric columns.
    #[error("dataset has no recognised metric column (expected one of: {expected})")]
    NoMetricColumns { expected: String },

    /// Every row was dropped (or the source was empty).
    #[error("dataset contains no usable rows")]
    NoRecords,

    /// The requested metric is not carried by this dataset.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parsed but was not an array of objects.
    #[error("malformed JSON records: {0}")]
    JsonShape(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
