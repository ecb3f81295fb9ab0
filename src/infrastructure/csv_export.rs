use crate::domain::{
    errors::IngestionError,
    models::{Transaction, TransferKind},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::{fs, path::Path, str::FromStr};

const EXPORT_PREFIX: &str = "transactions-";
const EXPORT_SUFFIX: &str = ".csv";
const STX_SYMBOL: &str = "STX";

// Column positions in the explorer export
const BURN_DATE: usize = 1;
const IN_SYMBOL: usize = 2;
const IN_AMOUNT: usize = 3;
const OUT_SYMBOL: usize = 4;
const OUT_AMOUNT: usize = 5;
const TX_ID: usize = 12;
const SENDER: usize = 16;
const RECIPIENT: usize = 17;

/// A CSV transaction export for a single owner address.
#[derive(Clone, Debug)]
pub struct ExportFile {
    pub name: String,
    pub content: String,
}

impl ExportFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// The owner address encoded in a `transactions-<owner>.csv` file name.
    pub fn owner(&self) -> Result<String, IngestionError> {
        owner_from_name(&self.name)
            .map(str::to_string)
            .ok_or_else(|| IngestionError::InvalidExportName(self.name.clone()))
    }
}

fn owner_from_name(name: &str) -> Option<&str> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    file_name
        .strip_prefix(EXPORT_PREFIX)?
        .strip_suffix(EXPORT_SUFFIX)
        .filter(|owner| !owner.is_empty())
}

/// Parses an explorer burn date into milliseconds since the epoch (UTC).
pub fn parse_burn_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(value, format) {
            return Some(date.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc().timestamp_millis())
}

fn parse_amount(value: &str) -> Decimal {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .unwrap_or(Decimal::ZERO)
}

/// Reads every STX leg out of one export. No filtering or ordering is applied.
pub fn read_export(file: &ExportFile) -> Result<Vec<Transaction>, IngestionError> {
    let owner = file.owner()?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file.content.as_bytes());

    let mut transactions = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let Some(timestamp) = parse_burn_date(field(BURN_DATE)) else {
            tracing::warn!(
                "Skipping row {} of {}: invalid date {:?}",
                line + 1,
                file.name,
                field(BURN_DATE)
            );
            continue;
        };
        let tx_id = field(TX_ID).to_string();

        let in_amount = parse_amount(field(IN_AMOUNT));
        let sender = field(SENDER);
        if field(IN_SYMBOL) == STX_SYMBOL && in_amount > Decimal::ZERO && !sender.is_empty() {
            transactions.push(Transaction {
                tx_id: tx_id.clone(),
                sender: sender.to_string(),
                recipient: owner.clone(),
                amount: in_amount,
                timestamp,
                kind: TransferKind::Receive,
                owner: owner.clone(),
            });
        }

        let out_amount = parse_amount(field(OUT_AMOUNT));
        let recipient = field(RECIPIENT);
        if field(OUT_SYMBOL) == STX_SYMBOL && out_amount > Decimal::ZERO && !recipient.is_empty()
        {
            transactions.push(Transaction {
                tx_id,
                sender: owner.clone(),
                recipient: recipient.to_string(),
                amount: out_amount,
                timestamp,
                kind: TransferKind::Send,
                owner: owner.clone(),
            });
        }
    }

    tracing::debug!("Read {} transfers from {}", transactions.len(), file.name);
    Ok(transactions)
}

/// Loads every `transactions-*.csv` export in `dir`, ordered by file name.
pub fn read_directory(dir: &Path) -> Result<Vec<ExportFile>, IngestionError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_export = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(owner_from_name)
            .is_some();
        if path.is_file() && is_export {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        tracing::info!("Loaded export {}", name);
        files.push(ExportFile { name, content });
    }
    Ok(files)
}
