use anyhow::Result;
use chrono::DateTime;
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use stx_flow_aggregator::application::{app, dataset::Dataset};
use stx_flow_aggregator::domain::config::{
    EngineConfig, RewardAddressMatcher, DAILY_REWARD, DAY_IN_MILLIS, INITIAL_ENDOWMENT,
    MIN_STX_THRESHOLD, MIN_TRANSACTION_AMOUNT,
};
use stx_flow_aggregator::domain::errors::AppError;
use stx_flow_aggregator::infrastructure::csv_export;
use stx_flow_aggregator::service;
use tokio::signal;
use tokio::sync::broadcast;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "STX transfer network and daily balance time series with REST API"
)]
struct FlowProgram {
    /// Directory holding transactions-<address>.csv exports
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Listen port REST API
    #[arg(short, long, default_value_t = 3000)]
    listen_port: u16,

    /// Minimum sent + received volume for an address to be tracked
    #[arg(long, default_value_t = Decimal::from(MIN_STX_THRESHOLD))]
    min_volume: Decimal,

    /// Transfers at or below this amount are dropped
    #[arg(long, default_value_t = Decimal::from(MIN_TRANSACTION_AMOUNT))]
    min_transaction_amount: Decimal,

    /// Start of reward accrual (RFC 3339)
    #[arg(long, default_value = "2025-09-15T00:00:00Z")]
    reward_start: String,

    /// Transfers at or before this instant are dropped (RFC 3339, defaults to the reward start)
    #[arg(long)]
    ingest_after: Option<String>,

    /// Bucket width in milliseconds
    #[arg(long, default_value_t = DAY_IN_MILLIS)]
    day_millis: i64,

    #[arg(long, default_value_t = Decimal::from(DAILY_REWARD))]
    daily_reward: Decimal,

    #[arg(long, default_value_t = Decimal::from(INITIAL_ENDOWMENT))]
    initial_endowment: Decimal,

    /// Reward address prefix
    #[arg(long, default_value = "SP000")]
    reward_prefix: String,

    /// Substring the reward address must contain
    #[arg(long, default_value = ".sip-031")]
    reward_contains: String,

    /// Extra address label as ADDRESS=NAME, repeatable
    #[arg(long = "label", value_parser = parse_label)]
    labels: Vec<(String, String)>,
}

fn parse_label(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((address, name)) if !address.is_empty() && !name.is_empty() => {
            Ok((address.to_string(), name.to_string()))
        }
        _ => Err(format!("expected ADDRESS=NAME, got {value:?}")),
    }
}

fn parse_millis(value: &str) -> Result<i64, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.timestamp_millis())
        .map_err(|_| AppError::InvalidDate(value.to_string()))
}

impl FlowProgram {
    fn engine_config(&self) -> Result<EngineConfig, AppError> {
        let reward_start = parse_millis(&self.reward_start)?;
        let ingest_after = match &self.ingest_after {
            Some(value) => parse_millis(value)?,
            None => reward_start,
        };

        let mut address_labels = EngineConfig::default().address_labels;
        address_labels.extend(self.labels.iter().cloned());

        let config = EngineConfig::builder()
            .min_volume(self.min_volume)
            .min_transaction_amount(self.min_transaction_amount)
            .day_millis(self.day_millis)
            .reward_start(reward_start)
            .daily_reward(self.daily_reward)
            .initial_endowment(self.initial_endowment)
            .ingest_after(ingest_after)
            .reward_address(
                RewardAddressMatcher::builder()
                    .prefix(self.reward_prefix.as_str())
                    .contains(self.reward_contains.as_str())
                    .build(),
            )
            .address_labels(address_labels)
            .build();
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = FlowProgram::parse();
    let engine_config = args.engine_config()?;

    let files = csv_export::read_directory(&args.data_dir)?;
    tracing::info!(
        "Loaded {} exports from {}",
        files.len(),
        args.data_dir.display()
    );
    let dataset = Dataset::from_exports(&files, engine_config)?;

    // Create a shutdown channel
    let (shutdown_sender, _) = broadcast::channel(1);

    let app = Arc::new(app::App::new(dataset));

    // Start the API server
    let server_handle = tokio::spawn(service::api::start_server(
        shutdown_sender.clone(),
        app.clone(),
        args.listen_port,
    ));

    // Wait for shutdown signal
    signal::ctrl_c().await?;
    tracing::warn!("Received Ctrl+C, shutting down...");

    if shutdown_sender.send(()).is_err() {
        tracing::warn!("API server already stopped");
    }

    match server_handle.await {
        Ok(Err(e)) => tracing::error!("API server error: {:?}", e),
        Err(e) => tracing::error!("API server task failed: {:?}", e),
        Ok(Ok(())) => {}
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
