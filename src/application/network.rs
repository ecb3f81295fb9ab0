use crate::domain::models::{NetworkData, NetworkLink, NetworkNode, Transaction};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Default, Clone, Copy)]
struct Totals {
    sent: Decimal,
    received: Decimal,
}

impl Totals {
    fn volume(&self) -> Decimal {
        self.sent + self.received
    }
}

/// Builds the graph of addresses whose volume reaches `min_volume`.
///
/// Links are kept only when both endpoints are tracked; flows to and from
/// untracked addresses disappear from the link list but still count in the
/// node totals.
pub fn calculate_network_data(transactions: &[Transaction], min_volume: Decimal) -> NetworkData {
    let mut totals: BTreeMap<&str, Totals> = BTreeMap::new();
    let mut pairs: BTreeMap<(&str, &str), Decimal> = BTreeMap::new();

    for tx in transactions {
        totals.entry(tx.sender.as_str()).or_default().sent += tx.amount;
        totals.entry(tx.recipient.as_str()).or_default().received += tx.amount;
        *pairs.entry((tx.sender.as_str(), tx.recipient.as_str())).or_default() += tx.amount;
    }

    let tracked: BTreeSet<&str> = totals
        .iter()
        .filter(|(_, totals)| totals.volume() >= min_volume)
        .map(|(address, _)| *address)
        .collect();

    let nodes = tracked
        .iter()
        .map(|address| {
            let Totals { sent, received } = totals[address];
            NetworkNode {
                id: address.to_string(),
                sent,
                received,
                balance: received - sent,
            }
        })
        .collect();

    let links = pairs
        .into_iter()
        .filter(|((source, target), _)| tracked.contains(source) && tracked.contains(target))
        .map(|((source, target), value)| NetworkLink {
            source: source.to_string(),
            target: target.to_string(),
            value,
        })
        .collect();

    NetworkData { nodes, links }
}

impl NetworkData {
    /// Ids of all tracked addresses.
    pub fn tracked_addresses(&self) -> BTreeSet<String> {
        self.nodes.iter().map(|node| node.id.clone()).collect()
    }
}
