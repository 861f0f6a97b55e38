//! Loader for the Mirai scan table.
//!
//! The table is positional CSV: identifier in column 0, destination port in
//! column 3, first/last seen timestamps in 7 and 8, ASN in 10, country in
//! 15, prefix in 17. An optional header row is recognized by a literal `ip`
//! in the first column. Malformed rows are skipped and tallied, never
//! fatal; only IO failures abort the load.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};

use botcensus_core::error::Malformed;
use botcensus_core::types::{valid_identifier, MiraiRow, SkipTally};

use crate::error::Result;

/// Timestamp layout of the seen columns and the configured date limit.
pub const SEEN_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

mod columns {
    pub const IP: usize = 0;
    pub const DST_PORT: usize = 3;
    pub const FIRST_SEEN: usize = 7;
    pub const LAST_SEEN: usize = 8;
    pub const ASN: usize = 10;
    pub const COUNTRY: usize = 15;
    pub const PREFIX: usize = 17;
    /// A usable row carries at least this many columns.
    pub const MIN_WIDTH: usize = 18;
}

/// The loaded table plus its skip audit.
#[derive(Debug, Clone, Default)]
pub struct MiraiTable {
    pub rows: Vec<MiraiRow>,
    pub skipped: SkipTally,
}

/// Parse the whole table once; callers reuse it across counting passes.
pub fn load_table(path: &Path) -> Result<MiraiTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut table = MiraiTable::default();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if index == 0 && is_header(&record) {
            continue;
        }
        match parse_row(&record) {
            Ok(row) => table.rows.push(row),
            Err(reason) => {
                tracing::debug!(line = index + 1, error = %reason, "Skipping row");
                table.skipped.record(&reason);
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        rows = table.rows.len(),
        skipped = table.skipped.total(),
        "Mirai table loaded"
    );
    Ok(table)
}

fn is_header(record: &csv::StringRecord) -> bool {
    record
        .get(columns::IP)
        .map(|v| v.trim().eq_ignore_ascii_case("ip"))
        .unwrap_or(false)
}

fn parse_row(record: &csv::StringRecord) -> std::result::Result<MiraiRow, Malformed> {
    if record.len() < columns::MIN_WIDTH {
        return Err(Malformed::TruncatedRow(record.len()));
    }
    let ip = record.get(columns::IP).unwrap_or_default();
    if !valid_identifier(ip) {
        return Err(Malformed::InvalidIdentifier(ip.to_string()));
    }
    let field = |i: usize| record.get(i).unwrap_or_default().to_string();
    Ok(MiraiRow {
        ip: ip.to_string(),
        dst_port: field(columns::DST_PORT),
        first_seen: parse_seen_timestamp(record.get(columns::FIRST_SEEN).unwrap_or_default()),
        last_seen: parse_seen_timestamp(record.get(columns::LAST_SEEN).unwrap_or_default()),
        asn: field(columns::ASN),
        country: field(columns::COUNTRY),
        prefix: field(columns::PREFIX),
    })
}

/// Parse a seen timestamp; `None` for anything off-layout.
pub fn parse_seen_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), SEEN_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
