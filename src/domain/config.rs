use super::errors::TimeSeriesError;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use typed_builder::TypedBuilder;

pub const DAY_IN_MILLIS: i64 = 24 * 60 * 60 * 1000;
pub const MIN_STX_THRESHOLD: i64 = 100_000;
pub const MIN_TRANSACTION_AMOUNT: i64 = 10;
pub const DAILY_REWARD: i64 = 68_400;
pub const INITIAL_ENDOWMENT: i64 = 200_000_000;
pub const SIP_031_ADDRESS: &str = "SP000000000000000000002Q6VF78.sip-031";

/// 2025-09-15T00:00:00Z
pub fn endowment_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Decides which address receives the synthetic daily reward.
#[derive(Clone, Debug, PartialEq, Eq, TypedBuilder)]
pub struct RewardAddressMatcher {
    #[builder(default = "SP000".to_string(), setter(into))]
    pub prefix: String,
    #[builder(default = ".sip-031".to_string(), setter(into))]
    pub contains: String,
}

impl Default for RewardAddressMatcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RewardAddressMatcher {
    pub fn matches(&self, address: &str) -> bool {
        address.starts_with(&self.prefix) && address.contains(&self.contains)
    }
}

fn default_labels() -> HashMap<String, String> {
    HashMap::from([
        (
            "SP2VCQJGH7PHP2DJK7Z0V48AGBHQAW3R3ZW1QF4N.pool-vault".to_string(),
            "Zest".to_string(),
        ),
        (
            "SP3YBY0BH4ANC0Q35QB6PD163F943FVFVDFM1SH7S.gl-core".to_string(),
            "Velar PerpDex".to_string(),
        ),
    ])
}

/// Tunables shared by ingestion, aggregation and the balance engine.
#[derive(Clone, Debug, TypedBuilder)]
pub struct EngineConfig {
    /// Addresses whose `sent + received` falls below this are not tracked.
    #[builder(default = Decimal::from(MIN_STX_THRESHOLD))]
    pub min_volume: Decimal,
    /// Transfers must be strictly larger than this to be ingested.
    #[builder(default = Decimal::from(MIN_TRANSACTION_AMOUNT))]
    pub min_transaction_amount: Decimal,
    /// Bucket width in milliseconds. Must be positive.
    #[builder(default = DAY_IN_MILLIS)]
    pub day_millis: i64,
    /// Rewards accrue at boundaries strictly after this timestamp (ms).
    #[builder(default = endowment_start().timestamp_millis())]
    pub reward_start: i64,
    #[builder(default = Decimal::from(DAILY_REWARD))]
    pub daily_reward: Decimal,
    #[builder(default)]
    pub reward_address: RewardAddressMatcher,
    /// Balance of the reward address before the first recorded transfer.
    #[builder(default = Decimal::from(INITIAL_ENDOWMENT))]
    pub initial_endowment: Decimal,
    /// Transfers at or before this timestamp (ms) are dropped at ingestion.
    #[builder(default = endowment_start().timestamp_millis())]
    pub ingest_after: i64,
    #[builder(default = default_labels())]
    pub address_labels: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), TimeSeriesError> {
        if self.day_millis <= 0 {
            return Err(TimeSeriesError::InvalidDayLength(self.day_millis));
        }
        Ok(())
    }

    /// The single address credited with rewards: the first match in `addresses`.
    ///
    /// Later matches are ordinary addresses and never mint.
    pub fn find_reward_address<'a, I>(&self, addresses: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        addresses
            .into_iter()
            .find(|address| self.reward_address.matches(address))
    }

    pub fn label(&self, address: &str) -> Option<&str> {
        self.address_labels.get(address).map(String::as_str)
    }

    /// Whole days elapsed between the reward start and `boundary`, times the daily reward.
    /// Zero at or before the start, and for a non-positive day length.
    pub fn reward_at(&self, boundary: i64) -> Decimal {
        if boundary <= self.reward_start {
            return Decimal::ZERO;
        }
        match (boundary - self.reward_start).checked_div(self.day_millis) {
            Some(days) if days > 0 => Decimal::from(days) * self.daily_reward,
            _ => Decimal::ZERO,
        }
    }
}
