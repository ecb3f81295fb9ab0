use super::errors::ViewStateError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Direction of a transfer relative to the owner of the export it came from.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Send,
    Receive,
}

/// Represents a single STX transfer between two addresses.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Transaction {
    /// Identifier of the ledger event; send and receive legs may share it
    pub tx_id: String,
    /// Address the STX left
    pub sender: String,
    /// Address the STX arrived at
    pub recipient: String,
    /// Amount transferred, in STX
    pub amount: Decimal,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Send or receive, seen from `owner`
    pub kind: TransferKind,
    /// Address whose export produced this record
    pub owner: String,
}

/// A tracked address with its cumulative flows.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct NetworkNode {
    pub id: String,
    pub sent: Decimal,
    pub received: Decimal,
    /// `received - sent`
    pub balance: Decimal,
}

/// Summed transfers from `source` to `target`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct NetworkLink {
    pub source: String,
    pub target: String,
    pub value: Decimal,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct NetworkData {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
}

/// Balances of every tracked address frozen at a day boundary.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Snapshot {
    pub timestamp: i64,
    pub balances: BTreeMap<String, Decimal>,
}

/// Snapshots ordered by strictly increasing boundary timestamp.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct TimeSeries {
    snapshots: Vec<Snapshot>,
}

impl TimeSeries {
    pub(crate) fn push(&mut self, snapshot: Snapshot) {
        debug_assert!(self
            .snapshots
            .last()
            .map_or(true, |last| last.timestamp < snapshot.timestamp));
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// The boundary timestamps, in order.
    pub fn boundaries(&self) -> Vec<i64> {
        self.snapshots.iter().map(|s| s.timestamp).collect()
    }

    pub fn get(&self, timestamp: i64) -> Option<&BTreeMap<String, Decimal>> {
        self.snapshots
            .binary_search_by_key(&timestamp, |s| s.timestamp)
            .ok()
            .map(|idx| &self.snapshots[idx].balances)
    }

    pub fn at_index(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }
}

/// One row of the addresses table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct LedgerEntry {
    pub id: String,
    pub label: Option<String>,
    pub minted: Decimal,
    pub received: Decimal,
    pub sent: Decimal,
    pub final_balance: Decimal,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct LedgerTotals {
    pub minted: Decimal,
    pub received: Decimal,
    pub sent: Decimal,
    pub final_balance: Decimal,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AddressLedger {
    pub entries: Vec<LedgerEntry>,
    /// Everything below the volume threshold, folded into one row
    pub low_volume: LedgerTotals,
    pub daily_rewards_minted: Decimal,
    pub totals: LedgerTotals,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CirculatingStats {
    pub timestamp: i64,
    pub day_index: usize,
    pub distributed: Decimal,
    pub active_addresses: usize,
    pub total_transactions: usize,
}

/// Pan and zoom of the network graph.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct GraphTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

/// Key-value storage for presentation state that outlives a page load.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ViewStateStore {
    /// Retrieves the raw JSON stored under `key`.
    async fn load(&self, key: &str) -> Result<Option<String>, ViewStateError>;

    /// Stores raw JSON under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: String) -> Result<(), ViewStateError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), ViewStateError>;
}
