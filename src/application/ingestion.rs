use crate::domain::{config::EngineConfig, errors::IngestionError, models::Transaction};
use crate::infrastructure::csv_export::{read_export, ExportFile};

/// Keeps transfers after the ingestion cutoff and above the dust amount, ordered by time.
///
/// The sort is stable, so transfers sharing a timestamp keep their export order.
pub fn normalize(transactions: Vec<Transaction>, config: &EngineConfig) -> Vec<Transaction> {
    let mut transactions: Vec<Transaction> = transactions
        .into_iter()
        .filter(|tx| {
            tx.timestamp > config.ingest_after && tx.amount > config.min_transaction_amount
        })
        .collect();
    transactions.sort_by_key(|tx| tx.timestamp);
    transactions
}

/// Parses all exports and returns the ordered transaction log.
pub fn parse_transaction_data(
    files: &[ExportFile],
    config: &EngineConfig,
) -> Result<Vec<Transaction>, IngestionError> {
    let mut transactions = Vec::new();
    for file in files {
        transactions.extend(read_export(file)?);
    }
    let total = transactions.len();
    let transactions = normalize(transactions, config);
    tracing::info!(
        "Ingested {} of {} transfers from {} exports",
        transactions.len(),
        total,
        files.len()
    );
    Ok(transactions)
}
