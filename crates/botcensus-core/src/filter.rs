//! Candidate selection over the Mirai table.
//!
//! Applies the configured port and date filters row by row and collects the
//! surviving identifiers. With date filtering active, a row whose seen
//! timestamp cannot be read is skipped and tallied, never fatal.

use crate::error::Malformed;
use crate::types::{is_telnet_port, FilterPolicy, IpSet, MiraiRow, SkipTally};

/// Outcome of one candidate-selection pass.
#[derive(Debug, Clone, Default)]
pub struct CandidateSelection {
    pub ips: IpSet,
    pub skipped: SkipTally,
}

/// Collect the identifier of every row that passes the active filters.
///
/// The date filter compares whole epoch seconds and keeps the boundary: a row
/// seen exactly at `date_limit` survives. The port filter parses the raw
/// `dst_port` text; non-numeric values never match it.
pub fn select_candidate_ips(table: &[MiraiRow], policy: &FilterPolicy) -> CandidateSelection {
    let mut out = CandidateSelection::default();
    for row in table {
        if policy.by_date {
            match policy.seen.of(row) {
                Some(seen) if seen.timestamp() >= policy.date_limit.timestamp() => {}
                Some(_) => continue,
                None => {
                    out.skipped.record(&Malformed::BadTimestamp(row.ip.clone()));
                    continue;
                }
            }
        }
        if policy.by_port && !telnet_dst_port(&row.dst_port) {
            continue;
        }
        out.ips.insert(row.ip.clone());
    }
    out
}

pub(crate) fn telnet_dst_port(raw: &str) -> bool {
    raw.trim()
        .parse::<u16>()
        .map(is_telnet_port)
        .unwrap_or(false)
}
