use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate};

use crate::models::{ChartRow, RawRow};

const MONTH_KEY: &str = "month";

/// Pivots flat rows into one row per distinct `month`, one key per blockchain.
///
/// Every output row carries every blockchain seen in the input (missing pairs are `0`).
/// A repeated (month, blockchain) pair keeps the last value. Rows come out ordered by
/// the month parsed as a date; months that do not parse go last. A blockchain literally
/// named `month` would collide with the month key and is skipped.
pub fn pivot_rows(rows: &[RawRow]) -> Vec<ChartRow> {
    let (rows, reserved): (Vec<&RawRow>, Vec<&RawRow>) =
        rows.iter().partition(|r| r.blockchain != MONTH_KEY);
    if !reserved.is_empty() {
        tracing::warn!(skipped = reserved.len(), "rows with blockchain named `month` skipped");
    }

    let blockchains: BTreeSet<&str> = rows.iter().map(|r| r.blockchain.as_str()).collect();
    tracing::debug!(count = blockchains.len(), ?blockchains, "unique blockchains");

    let mut grouped: HashMap<&str, BTreeMap<String, f64>> = HashMap::new();
    for row in &rows {
        let values = grouped.entry(row.month.as_str()).or_insert_with(|| {
            blockchains
                .iter()
                .map(|chain| (chain.to_string(), 0.0))
                .collect()
        });
        values.insert(row.blockchain.clone(), row.gas_fees);
    }

    let mut keyed: Vec<_> = grouped
        .into_iter()
        .map(|(month, values)| {
            let date = parse_month(month);
            let row = ChartRow {
                month: month.to_string(),
                values,
            };
            ((date.is_none(), date, row.month.clone()), row)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let pivoted: Vec<ChartRow> = keyed.into_iter().map(|(_, row)| row).collect();
    tracing::debug!(months = pivoted.len(), "processed chart rows");
    pivoted
}

/// Reads the date part of a month value.
///
/// Accepts `2024-01-01`, `2024-01`, RFC 3339 and Dune's `2024-01-01 00:00:00.000 UTC`.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    let date_part = raw.split(|c: char| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", date_part), "%Y-%m-%d"))
        .ok()
}
