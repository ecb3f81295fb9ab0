use crate::domain::{
    config::DAY_IN_MILLIS,
    models::{Snapshot, TimeSeries, Transaction},
};
use chrono::NaiveDate;

/// Index of the latest boundary at or before `t`, clamped to the valid range.
pub fn day_index_at_time(boundaries: &[i64], t: i64) -> usize {
    boundaries
        .partition_point(|boundary| *boundary <= t)
        .saturating_sub(1)
}

/// Transactions in `[boundaries[index], boundaries[index] + day)`.
///
/// The bucket at index 0 is the padding day before the first transaction and is always empty.
pub fn transactions_for_day<'a>(
    boundaries: &[i64],
    index: usize,
    transactions: &'a [Transaction],
    day_millis: i64,
) -> &'a [Transaction] {
    if index == 0 {
        return &[];
    }
    let Some(&start) = boundaries.get(index) else {
        return &[];
    };
    let end = start + day_millis;
    let from = transactions.partition_point(|tx| tx.timestamp < start);
    let to = transactions.partition_point(|tx| tx.timestamp < end);
    &transactions[from..to]
}

/// Resolves a `YYYY-MM-DD` date to a boundary timestamp.
///
/// Prefers the earliest boundary falling on that UTC calendar day, whatever the bucket width. A day with no boundary that still lies
/// strictly inside the data range resolves to its midnight. Anything else, including a missing or
/// malformed date, resolves to the first boundary (0 when there are none).
pub fn nearest_day_from_date(date: Option<&str>, boundaries: &[i64]) -> i64 {
    let (Some(&min), Some(&max)) = (boundaries.first(), boundaries.last()) else {
        return 0;
    };
    let Some(day_start) = date.and_then(parse_day_start) else {
        return min;
    };
    let day_end = day_start + DAY_IN_MILLIS;

    if let Some(&exact) = boundaries
        .iter()
        .find(|boundary| (day_start..day_end).contains(*boundary))
    {
        return exact;
    }
    if day_start > min && day_start < max {
        return day_start;
    }
    min
}

fn parse_day_start(date: &str) -> Option<i64> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

pub fn balances_for_day(series: &TimeSeries, index: usize) -> Option<&Snapshot> {
    series.at_index(index)
}
