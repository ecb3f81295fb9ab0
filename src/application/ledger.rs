use super::timeline::day_index_at_time;
use crate::domain::{
    config::EngineConfig,
    models::{AddressLedger, LedgerEntry, LedgerTotals, NetworkNode, TimeSeries, Transaction},
};
use rust_decimal::Decimal;

/// Rewards minted between the reward start and the last transaction.
pub fn daily_rewards_minted(transactions: &[Transaction], config: &EngineConfig) -> Decimal {
    transactions
        .last()
        .map(|tx| config.reward_at(tx.timestamp))
        .unwrap_or(Decimal::ZERO)
}

fn sum(entries: &[LedgerEntry]) -> LedgerTotals {
    entries
        .iter()
        .fold(LedgerTotals::default(), |mut acc, entry| {
            acc.minted += entry.minted;
            acc.received += entry.received;
            acc.sent += entry.sent;
            acc.final_balance += entry.final_balance;
            acc
        })
}

/// Builds the addresses table: one row per tracked node, a row folding every
/// low-volume address, and grand totals.
///
/// Only the reward address mints, receiving the initial endowment plus the
/// daily rewards accrued up to the last transaction.
pub fn address_ledger(
    nodes: &[NetworkNode],
    transactions: &[Transaction],
    config: &EngineConfig,
) -> AddressLedger {
    let rewards = daily_rewards_minted(transactions, config);
    let total_minted = config.initial_endowment + rewards;
    let reward_address = config.find_reward_address(nodes.iter().map(|node| node.id.as_str()));

    let entries: Vec<LedgerEntry> = nodes
        .iter()
        .map(|node| {
            let minted = if reward_address == Some(node.id.as_str()) {
                total_minted
            } else {
                Decimal::ZERO
            };
            LedgerEntry {
                id: node.id.clone(),
                label: config.label(&node.id).map(str::to_string),
                minted,
                received: node.received,
                sent: node.sent,
                final_balance: minted + node.received - node.sent,
            }
        })
        .collect();

    let displayed = sum(&entries);
    // net outflow from the tracked set went to low-volume addresses
    let net = displayed.sent - displayed.received;
    let low_volume = LedgerTotals {
        minted: total_minted - displayed.minted,
        received: net.max(Decimal::ZERO),
        sent: (-net).max(Decimal::ZERO),
        final_balance: total_minted - displayed.final_balance,
    };

    let totals = LedgerTotals {
        minted: displayed.minted + low_volume.minted,
        received: displayed.received + low_volume.received,
        sent: displayed.sent + low_volume.sent,
        final_balance: displayed.final_balance + low_volume.final_balance,
    };

    AddressLedger {
        entries,
        low_volume,
        daily_rewards_minted: rewards,
        totals,
    }
}

/// Sum of every balance except the reward address at the bucket containing `t`.
pub fn distributed_at(series: &TimeSeries, t: i64, config: &EngineConfig) -> Decimal {
    let boundaries = series.boundaries();
    series
        .at_index(day_index_at_time(&boundaries, t))
        .map(|snapshot| {
            let reward_address =
                config.find_reward_address(snapshot.balances.keys().map(String::as_str));
            snapshot
                .balances
                .iter()
                .filter(|(address, _)| reward_address != Some(address.as_str()))
                .map(|(_, balance)| *balance)
                .sum::<Decimal>()
        })
        .unwrap_or(Decimal::ZERO)
}
