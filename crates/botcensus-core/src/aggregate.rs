//! Counting and grouping passes over the Mirai table.
//!
//! The destructive passes take their infected set by value: each pass
//! consumes a private copy and removes an identifier the first time it
//! matches a row, so one IP contributes at most one count per pass no
//! matter how many rows repeat it. Callers clone the infected set once per
//! pass; iteration is always over the table, mutation only over the owned
//! set.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{AggregateCount, Dimension, IpSet, MiraiRow};

/// Count infected identifiers per value of `dimension`.
///
/// Attribution follows table order: the first row mentioning a still
/// uncounted infected IP decides which label that IP counts under.
pub fn count_by(table: &[MiraiRow], infected: IpSet, dimension: Dimension) -> AggregateCount {
    count_first_match(table, infected, |row| dimension.value_of(row))
}

/// Count infected identifiers per raw `dst_port` value.
///
/// Same at-most-once semantics as [`count_by`]. The key is the untouched
/// column text, so the result may name ports beyond the telnet pair.
pub fn count_ports(table: &[MiraiRow], infected: IpSet) -> AggregateCount {
    count_first_match(table, infected, |row| row.dst_port.as_str())
}

fn count_first_match<F>(table: &[MiraiRow], mut infected: IpSet, key: F) -> AggregateCount
where
    F: Fn(&MiraiRow) -> &str,
{
    let mut counts = AggregateCount::new();
    for row in table {
        if infected.remove(&row.ip) {
            *counts.entry(key(row).to_string()).or_insert(0) += 1;
            if infected.is_empty() {
                break;
            }
        }
    }
    counts
}

/// For each infected IP, the set of distinct `dimension` values across all
/// of its rows.
///
/// Non-destructive; the ordered maps keep exports deterministic.
pub fn group_by_dimension(
    table: &[MiraiRow],
    infected: &IpSet,
    dimension: Dimension,
) -> BTreeMap<String, BTreeSet<String>> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in table {
        if infected.contains(&row.ip) {
            groups
                .entry(row.ip.clone())
                .or_default()
                .insert(dimension.value_of(row).to_string());
        }
    }
    groups
}

/// Order counter entries by descending count, ties ascending by label, so
/// equal counts always export in the same order.
pub fn rank(counts: &AggregateCount) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}
