use super::{
    balances::compute_time_series, ingestion::parse_transaction_data,
    network::calculate_network_data,
};
use crate::domain::{
    config::EngineConfig,
    errors::AppError,
    models::{NetworkData, TimeSeries, Transaction},
};
use crate::infrastructure::csv_export::ExportFile;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

/// Everything computed from one load of the transaction exports.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub config: EngineConfig,
    pub transactions: Vec<Transaction>,
    pub network: NetworkData,
    pub tracked: BTreeSet<String>,
    pub initial_balances: HashMap<String, Decimal>,
    pub time_series: TimeSeries,
    pub boundaries: Vec<i64>,
}

impl Dataset {
    pub fn from_exports(files: &[ExportFile], config: EngineConfig) -> Result<Self, AppError> {
        let transactions = parse_transaction_data(files, &config)?;
        Self::build(transactions, config)
    }

    /// Aggregates an ordered transaction log into the graph and its balance time series.
    ///
    /// The tracked reward address starts with the configured endowment. An empty log
    /// yields an empty graph and series instead of an error.
    pub fn build(transactions: Vec<Transaction>, config: EngineConfig) -> Result<Self, AppError> {
        config.validate()?;
        let network = calculate_network_data(&transactions, config.min_volume);
        let tracked = network.tracked_addresses();

        let initial_balances: HashMap<String, Decimal> = config
            .find_reward_address(tracked.iter().map(String::as_str))
            .map(|address| (address.to_string(), config.initial_endowment))
            .into_iter()
            .collect();
        if initial_balances.is_empty() {
            tracing::warn!("No tracked reward address, endowment not seeded");
        }

        let time_series = if transactions.is_empty() {
            tracing::warn!("No transactions to aggregate");
            TimeSeries::default()
        } else {
            compute_time_series(&transactions, &tracked, Some(&initial_balances), &config)?
        };
        let boundaries = time_series.boundaries();

        tracing::info!(
            "Dataset ready: {} transactions, {} nodes, {} links, {} days",
            transactions.len(),
            network.nodes.len(),
            network.links.len(),
            boundaries.len()
        );

        Ok(Self {
            config,
            transactions,
            network,
            tracked,
            initial_balances,
            time_series,
            boundaries,
        })
    }
}
