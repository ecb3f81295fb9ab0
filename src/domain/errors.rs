use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to read transaction export: {0}")]
    FailedToReadExport(#[from] std::io::Error),
    #[error("Failed to parse transaction export")]
    FailedToParseCsv(#[from] csv::Error),
    #[error("Invalid transaction export file name: {0}")]
    InvalidExportName(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimeSeriesError {
    #[error("Cannot compute a time series without transactions")]
    EmptyInput,
    #[error("Day length must be positive, got {0} ms")]
    InvalidDayLength(i64),
    #[error("Transaction {index} at {current} precedes the previous one at {previous}")]
    UnorderedInput {
        index: usize,
        previous: i64,
        current: i64,
    },
}

#[derive(Error, Debug)]
pub enum ViewStateError {
    #[error("View state not found: {0}")]
    KeyNotFound(String),
    #[error("Failed to serialize view state")]
    FailedToSerialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to ingest transactions")]
    FailedToIngest(#[from] IngestionError),
    #[error("Failed to compute time series")]
    FailedToComputeTimeSeries(#[from] TimeSeriesError),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
