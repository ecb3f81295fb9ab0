use crate::domain::{
    config::EngineConfig,
    errors::TimeSeriesError,
    models::{Snapshot, TimeSeries, Transaction},
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Running balances driven only by transfers. Snapshots are copies of it.
struct LiveBalances<'a> {
    balances: BTreeMap<&'a str, Decimal>,
}

impl<'a> LiveBalances<'a> {
    fn new(tracked: &'a BTreeSet<String>, initial: Option<&HashMap<String, Decimal>>) -> Self {
        let balances = tracked
            .iter()
            .map(|address| {
                let opening = initial
                    .and_then(|initial| initial.get(address))
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                (address.as_str(), opening)
            })
            .collect();
        Self { balances }
    }

    fn apply(&mut self, tx: &Transaction) {
        if let Some(balance) = self.balances.get_mut(tx.sender.as_str()) {
            *balance -= tx.amount;
        }
        if let Some(balance) = self.balances.get_mut(tx.recipient.as_str()) {
            *balance += tx.amount;
        }
    }

    /// Freezes the current balances at `boundary`, adding the accrued reward to the copy.
    fn snapshot(
        &self,
        boundary: i64,
        reward_address: Option<&str>,
        config: &EngineConfig,
    ) -> Snapshot {
        let reward = config.reward_at(boundary);
        let balances = self
            .balances
            .iter()
            .map(|(address, balance)| {
                let mut balance = *balance;
                if reward_address == Some(*address) {
                    balance += reward;
                }
                (address.to_string(), balance)
            })
            .collect();
        Snapshot {
            timestamp: boundary,
            balances,
        }
    }
}

fn ensure_ordered(transactions: &[Transaction]) -> Result<(), TimeSeriesError> {
    match transactions
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        Some(idx) => Err(TimeSeriesError::UnorderedInput {
            index: idx + 1,
            previous: transactions[idx].timestamp,
            current: transactions[idx + 1].timestamp,
        }),
        None => Ok(()),
    }
}

/// Walks the ordered transactions once and snapshots every tracked balance at each day boundary.
///
/// The first boundary sits one day before the first transaction. A transaction at or past
/// `boundary + day` closes the current bucket and becomes the next boundary, so days without
/// transactions produce no snapshot. The last bucket is closed after the loop under its own
/// boundary, which is the last transaction that opened a bucket, not necessarily the last one.
///
/// The first tracked address matching the reward matcher gets
/// `floor((boundary - reward_start) / day) * daily_reward` on top of its live balance in each
/// snapshot after the reward start; the live balance itself never changes.
///
/// # Errors
///
/// * `TimeSeriesError::InvalidDayLength` - `day_millis` is not positive.
/// * `TimeSeriesError::EmptyInput` - there is no transaction to derive the first boundary from.
/// * `TimeSeriesError::UnorderedInput` - the transactions are not sorted by timestamp.
pub fn compute_time_series(
    transactions: &[Transaction],
    tracked: &BTreeSet<String>,
    initial_balances: Option<&HashMap<String, Decimal>>,
    config: &EngineConfig,
) -> Result<TimeSeries, TimeSeriesError> {
    config.validate()?;
    let first = transactions.first().ok_or(TimeSeriesError::EmptyInput)?;
    ensure_ordered(transactions)?;

    let reward_address = config.find_reward_address(tracked.iter().map(String::as_str));
    let mut live = LiveBalances::new(tracked, initial_balances);
    let mut series = TimeSeries::default();
    let mut boundary = first.timestamp - config.day_millis;

    for tx in transactions {
        if tx.timestamp >= boundary + config.day_millis {
            series.push(live.snapshot(boundary, reward_address, config));
            tracing::debug!("Closed bucket {} at transaction {}", boundary, tx.tx_id);
            boundary = tx.timestamp;
        }
        live.apply(tx);
    }
    series.push(live.snapshot(boundary, reward_address, config));

    tracing::info!(
        "Computed {} snapshots for {} addresses over {} transactions",
        series.len(),
        tracked.len(),
        transactions.len()
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{DAILY_REWARD, DAY_IN_MILLIS};
    use crate::domain::models::TransferKind;

    const T1: i64 = 1_757_894_400_001;
    const CONTRACT: &str = "SP000.sip-031";

    fn tx(sender: &str, recipient: &str, amount: i64, timestamp: i64) -> Transaction {
        Transaction {
            tx_id: format!("{sender}-{recipient}-{timestamp}"),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount: Decimal::from(amount),
            timestamp,
            kind: TransferKind::Send,
            owner: sender.to_string(),
        }
    }

    fn tracked(addresses: &[&str]) -> BTreeSet<String> {
        addresses.iter().map(|a| a.to_string()).collect()
    }

    fn balances(entries: &[(&str, i64)]) -> BTreeMap<String, Decimal> {
        entries
            .iter()
            .map(|(address, amount)| (address.to_string(), Decimal::from(*amount)))
            .collect()
    }

    fn scenario() -> Vec<Transaction> {
        vec![
            tx("A", "B", 100_000_000, T1),
            tx("B", CONTRACT, 50_000_000, T1),
            tx("A", CONTRACT, 30_000_000, T1 + DAY_IN_MILLIS + 2),
        ]
    }

    #[test]
    fn test_empty_input_fails() {
        let result = compute_time_series(&[], &tracked(&["A"]), None, &EngineConfig::default());
        assert_eq!(result, Err(TimeSeriesError::EmptyInput));
    }

    #[test]
    fn test_unordered_input_fails() {
        let transactions = vec![tx("A", "B", 1, 10), tx("A", "B", 1, 30), tx("A", "B", 1, 20)];
        let result =
            compute_time_series(&transactions, &tracked(&["A", "B"]), None, &EngineConfig::default());
        assert_eq!(
            result,
            Err(TimeSeriesError::UnorderedInput {
                index: 2,
                previous: 30,
                current: 20
            })
        );
    }

    #[test]
    fn test_end_to_end_scenario() {
        let initial = HashMap::from([("A".to_string(), Decimal::from(130_000_000))]);
        let series = compute_time_series(
            &scenario(),
            &tracked(&["A", "B", CONTRACT]),
            Some(&initial),
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(
            series.boundaries(),
            vec![T1 - DAY_IN_MILLIS, T1, T1 + DAY_IN_MILLIS + 2]
        );
        assert_eq!(
            series.get(T1 - DAY_IN_MILLIS),
            Some(&balances(&[("A", 130_000_000), ("B", 0), (CONTRACT, 0)]))
        );
        assert_eq!(
            series.get(T1),
            Some(&balances(&[
                ("A", 30_000_000),
                ("B", 50_000_000),
                (CONTRACT, 50_000_000)
            ]))
        );
        // one whole day since the reward start has elapsed at the last boundary
        assert_eq!(
            series.get(T1 + DAY_IN_MILLIS + 2),
            Some(&balances(&[
                ("A", 0),
                ("B", 50_000_000),
                (CONTRACT, 80_000_000 + DAILY_REWARD)
            ]))
        );
    }

    #[test]
    fn test_same_timestamp_shares_bucket() {
        let t0 = 5 * DAY_IN_MILLIS;
        let transactions = vec![
            tx("A", "B", 1, t0),
            tx("A", "B", 1, t0),
            tx("A", "B", 1, t0 + DAY_IN_MILLIS + 3),
        ];
        let series =
            compute_time_series(&transactions, &tracked(&["A", "B"]), None, &EngineConfig::default())
                .unwrap();

        assert_eq!(
            series.boundaries(),
            vec![t0 - DAY_IN_MILLIS, t0, t0 + DAY_IN_MILLIS + 3]
        );
        assert_eq!(series.get(t0), Some(&balances(&[("A", -2), ("B", 2)])));
    }

    #[test]
    fn test_transactions_within_a_day_of_boundary_accumulate() {
        let t0 = 10 * DAY_IN_MILLIS;
        let transactions = vec![
            tx("A", "B", 1, t0),
            tx("A", "B", 1, t0 + DAY_IN_MILLIS - 1),
            tx("A", "B", 1, t0 + DAY_IN_MILLIS),
        ];
        let series =
            compute_time_series(&transactions, &tracked(&["A", "B"]), None, &EngineConfig::default())
                .unwrap();

        assert_eq!(
            series.boundaries(),
            vec![t0 - DAY_IN_MILLIS, t0, t0 + DAY_IN_MILLIS]
        );
        assert_eq!(series.get(t0), Some(&balances(&[("A", -2), ("B", 2)])));
        assert_eq!(
            series.get(t0 + DAY_IN_MILLIS),
            Some(&balances(&[("A", -3), ("B", 3)]))
        );
    }

    #[test]
    fn test_last_key_is_last_bucket_opener() {
        let config = EngineConfig::default();
        let start = config.reward_start;
        let opener = start + 2 * DAY_IN_MILLIS;
        let transactions = vec![
            tx("A", CONTRACT, 10, start + 1),
            tx("A", CONTRACT, 20, opener),
            tx(CONTRACT, "B", 5, opener + DAY_IN_MILLIS - 1),
        ];
        let series =
            compute_time_series(&transactions, &tracked(&["A", "B", CONTRACT]), None, &config)
                .unwrap();

        assert_eq!(
            series.boundaries(),
            vec![start + 1 - DAY_IN_MILLIS, start + 1, opener]
        );
        // the trailing transfer is folded into the bucket keyed at `opener`
        assert_eq!(
            series.get(opener),
            Some(&balances(&[
                ("A", -30),
                ("B", 5),
                (CONTRACT, 25 + 2 * DAILY_REWARD)
            ]))
        );
        assert_eq!(series.get(opener + DAY_IN_MILLIS - 1), None);
    }

    #[test]
    fn test_non_positive_day_length_fails() {
        let config = EngineConfig::builder().day_millis(0).build();
        let transactions = vec![tx("A", "B", 1, 100), tx("A", "B", 1, 100)];
        assert_eq!(
            compute_time_series(&transactions, &tracked(&["A", "B"]), None, &config),
            Err(TimeSeriesError::InvalidDayLength(0))
        );

        let config = EngineConfig::builder().day_millis(-DAY_IN_MILLIS).build();
        assert_eq!(
            compute_time_series(&[], &tracked(&["A"]), None, &config),
            Err(TimeSeriesError::InvalidDayLength(-DAY_IN_MILLIS))
        );
    }

    #[test]
    fn test_reward_credited_to_first_matching_address_only() {
        let config = EngineConfig::default();
        let start = config.reward_start;
        let first = "SP000X.sip-031";
        let second = "SP000Y.sip-031-v2";
        let transactions = vec![
            tx("A", "B", 1, start + 1),
            tx("A", "B", 1, start + 3 * DAY_IN_MILLIS),
        ];
        let addresses = tracked(&["A", "B", first, second]);
        let series = compute_time_series(&transactions, &addresses, None, &config).unwrap();

        let last = series.snapshots().last().unwrap();
        assert_eq!(last.balances[first], Decimal::from(3 * DAILY_REWARD));
        assert_eq!(last.balances[second], Decimal::ZERO);
        let total: Decimal = last.balances.values().copied().sum();
        assert_eq!(total, config.reward_at(last.timestamp));
    }

    #[test]
    fn test_single_transaction() {
        let t0 = 3 * DAY_IN_MILLIS;
        let series = compute_time_series(
            &[tx("A", "B", 7, t0)],
            &tracked(&["A", "B"]),
            None,
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(series.boundaries(), vec![t0 - DAY_IN_MILLIS, t0]);
        assert_eq!(series.get(t0), Some(&balances(&[("A", -7), ("B", 7)])));
    }

    #[test]
    fn test_gap_produces_single_rollover_with_full_reward() {
        let config = EngineConfig::default();
        let start = config.reward_start;
        let transactions = vec![
            tx("A", CONTRACT, 10, start + 1),
            tx("A", CONTRACT, 10, start + 5 * DAY_IN_MILLIS + 1),
        ];
        let series =
            compute_time_series(&transactions, &tracked(&["A", CONTRACT]), None, &config).unwrap();

        assert_eq!(
            series.boundaries(),
            vec![start + 1 - DAY_IN_MILLIS, start + 1, start + 5 * DAY_IN_MILLIS + 1]
        );
        assert_eq!(
            series.get(start + 5 * DAY_IN_MILLIS + 1).unwrap()[CONTRACT],
            Decimal::from(20 + 5 * DAILY_REWARD)
        );
    }

    #[test]
    fn test_reward_only_on_snapshot_copy() {
        let config = EngineConfig::default();
        let start = config.reward_start;
        let transactions = vec![
            tx("A", "B", 1, start - DAY_IN_MILLIS),
            tx("A", "B", 1, start),
            tx("A", "B", 1, start + 2 * DAY_IN_MILLIS),
            tx("A", "B", 1, start + 4 * DAY_IN_MILLIS),
        ];
        let series =
            compute_time_series(&transactions, &tracked(&["A", "B", CONTRACT]), None, &config)
                .unwrap();

        let rewards: Vec<Decimal> = series
            .snapshots()
            .iter()
            .map(|s| s.balances[CONTRACT])
            .collect();
        // no accumulation across snapshots: each is days_elapsed * reward on a zero live balance
        assert_eq!(
            rewards,
            vec![
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::from(2 * DAILY_REWARD),
                Decimal::from(4 * DAILY_REWARD),
            ]
        );
    }

    #[test]
    fn test_custom_reward_configuration() {
        let config = EngineConfig::builder()
            .reward_start(0)
            .day_millis(1000)
            .daily_reward(Decimal::from(5))
            .reward_address(
                crate::domain::config::RewardAddressMatcher::builder()
                    .prefix("R")
                    .contains("")
                    .build(),
            )
            .build();
        let transactions = vec![tx("A", "R1", 1, 1500), tx("A", "R1", 1, 3700)];
        let series =
            compute_time_series(&transactions, &tracked(&["A", "R1"]), None, &config).unwrap();

        assert_eq!(series.boundaries(), vec![500, 1500, 3700]);
        let r1: Vec<Decimal> = series.snapshots().iter().map(|s| s.balances["R1"]).collect();
        assert_eq!(
            r1,
            vec![Decimal::ZERO, Decimal::from(1 + 5), Decimal::from(2 + 15)]
        );
    }

    #[test]
    fn test_untracked_and_idle_addresses() {
        let initial = HashMap::from([
            ("idle".to_string(), Decimal::from(42)),
            ("ghost".to_string(), Decimal::from(1000)),
        ]);
        let transactions = vec![
            tx("A", "outsider", 100, DAY_IN_MILLIS),
            tx("outsider", "A", 40, 3 * DAY_IN_MILLIS),
        ];
        let series = compute_time_series(
            &transactions,
            &tracked(&["A", "idle"]),
            Some(&initial),
            &EngineConfig::default(),
        )
        .unwrap();

        for snapshot in series.snapshots() {
            assert_eq!(snapshot.balances.len(), 2);
            assert_eq!(snapshot.balances["idle"], Decimal::from(42));
            assert!(!snapshot.balances.contains_key("outsider"));
            assert!(!snapshot.balances.contains_key("ghost"));
        }
        let last = series.snapshots().last().unwrap();
        assert_eq!(last.balances["A"], Decimal::from(-60));
    }

    #[test]
    fn test_keys_strictly_increase_and_balances_conserve() {
        let config = EngineConfig::default();
        let start = config.reward_start;
        let addresses = ["A", "B", "C", CONTRACT];
        let mut transactions = Vec::new();
        for i in 0..60i64 {
            let sender = addresses[(i % 4) as usize];
            let recipient = if i % 7 == 0 { "outside" } else { addresses[((i + 1) % 4) as usize] };
            transactions.push(tx(sender, recipient, 1_000 + i, start + i * (DAY_IN_MILLIS / 3)));
        }
        let initial = HashMap::from([(CONTRACT.to_string(), Decimal::from(1_000_000))]);
        let tracked = tracked(&addresses);
        let series = compute_time_series(&transactions, &tracked, Some(&initial), &config).unwrap();

        let boundaries = series.boundaries();
        assert!(boundaries.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(boundaries[0], transactions[0].timestamp - DAY_IN_MILLIS);
        // every third transfer opens a bucket; the last two fall inside the final one
        assert_eq!(boundaries.len(), 21);
        assert_eq!(*boundaries.last().unwrap(), transactions[57].timestamp);

        let all_applied: Decimal = tracked
            .iter()
            .map(|address| {
                let net: Decimal = transactions
                    .iter()
                    .map(|tx| {
                        let mut delta = Decimal::ZERO;
                        if &tx.recipient == address {
                            delta += tx.amount;
                        }
                        if &tx.sender == address {
                            delta -= tx.amount;
                        }
                        delta
                    })
                    .sum();
                net
            })
            .sum();
        let last = series.snapshots().last().unwrap();
        let total: Decimal = last.balances.values().copied().sum();
        let reward = config.reward_at(last.timestamp);
        assert_eq!(total - reward, Decimal::from(1_000_000) + all_applied);
    }
}
