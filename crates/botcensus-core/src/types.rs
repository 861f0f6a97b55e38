//! Core domain types for the botcensus infection-report pipeline.
//!
//! These types carry records from the two input datasets through filtering,
//! matching, and aggregation, shared between the core logic and the
//! report binary.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifiers & collections ─────────────────────────────────────

/// Set of device identifiers (IP addresses as strings).
pub type IpSet = HashSet<String>;

/// Counter table keyed by an opaque label (prefix, country, ASN, port).
pub type AggregateCount = HashMap<String, u64>;

/// Identifier-to-banner lookup. Last write wins on duplicate identifiers.
pub type BannerMap = HashMap<String, String>;

/// Banner-to-identifiers grouping. IP lists are kept sorted.
pub type BannerGroup = HashMap<String, Vec<String>>;

/// Ports that mark a record as telnet-eligible.
pub const TELNET_PORTS: [u16; 2] = [23, 2323];

pub fn is_telnet_port(port: u16) -> bool {
    TELNET_PORTS.contains(&port)
}

/// A usable device identifier: longer than 2 characters, no whitespace,
/// and a parseable IP address.
pub fn valid_identifier(raw: &str) -> bool {
    raw.len() > 2 && !raw.chars().any(char::is_whitespace) && raw.parse::<IpAddr>().is_ok()
}

// ── Mirai rows ────────────────────────────────────────────────────

/// One observation row from the Mirai scan log.
///
/// Timestamps are parsed at load time; `None` means the column was absent or
/// unparsable, which only matters once date filtering needs the value.
/// `dst_port` stays the raw column text because it doubles as the key of the
/// port counting pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MiraiRow {
    pub ip: String,
    pub dst_port: String,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub asn: String,
    pub country: String,
    pub prefix: String,
}

/// Which observation timestamp the date filter compares against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeenField {
    FirstSeen,
    LastSeen,
}

impl SeenField {
    pub fn of(&self, row: &MiraiRow) -> Option<DateTime<Utc>> {
        match self {
            SeenField::FirstSeen => row.first_seen,
            SeenField::LastSeen => row.last_seen,
        }
    }
}

/// Grouping dimensions of the Mirai table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Prefix,
    Country,
    Asn,
}

impl Dimension {
    pub fn value_of<'a>(&self, row: &'a MiraiRow) -> &'a str {
        match self {
            Dimension::Prefix => &row.prefix,
            Dimension::Country => &row.country,
            Dimension::Asn => &row.asn,
        }
    }

    /// File-name fragment for exports and charts.
    pub fn slug(&self) -> &'static str {
        match self {
            Dimension::Prefix => "prefix",
            Dimension::Country => "country",
            Dimension::Asn => "asn",
        }
    }

    /// Human-readable chart caption.
    pub fn chart_title(&self) -> &'static str {
        match self {
            Dimension::Prefix => "Number of infected devices grouped by Prefix",
            Dimension::Country => "Number of infected devices grouped by country",
            Dimension::Asn => "Number of infected devices grouped by ASN number",
        }
    }
}

// ── Censys records ────────────────────────────────────────────────

/// Schema generation of the Censys export being loaded.
///
/// v1 records carry a single `port_number` plus `protocol` and a
/// base64-encoded banner; v2 records carry a `ports` list and a plain-text
/// banner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CensysVersion {
    V1,
    V2,
}

/// Per-record device metadata retained for the description classifier.
/// Collected for every well-formed record, telnet-eligible or not, because
/// classifier membership is decided by IP alone.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceObservation {
    pub ip: String,
    pub asn: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
}

/// Everything the Censys loader extracts in its single pass over a
/// directory of JSON record files.
#[derive(Debug, Clone, Default)]
pub struct CensysCatalog {
    /// Identifiers of telnet-eligible records.
    pub eligible: IpSet,
    /// Eligible identifiers that presented a non-empty banner.
    pub with_banner: IpSet,
    /// Eligible identifiers whose banner was empty or absent.
    pub without_banner: IpSet,
    /// Banner text per identifier, eligible records only.
    pub banners: BannerMap,
    /// Device metadata for the classifier, all well-formed records.
    pub observations: Vec<DeviceObservation>,
    /// Records excluded for lacking a telnet port.
    pub excluded_other_ports: u64,
    pub skipped: SkipTally,
}

// ── Filter policy ─────────────────────────────────────────────────

/// Toggleable row filters applied when selecting candidate IPs from the
/// Mirai table. All four on/off combinations are valid.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    pub by_port: bool,
    pub by_date: bool,
    pub date_limit: DateTime<Utc>,
    pub seen: SeenField,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            by_port: false,
            by_date: false,
            date_limit: DateTime::UNIX_EPOCH,
            seen: SeenField::FirstSeen,
        }
    }
}

// ── Audit tallies ─────────────────────────────────────────────────

/// Records skipped during loading or filtering, by category. Malformed
/// input never aborts a batch; it lands here and is surfaced in the final
/// report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipTally {
    /// Identifier missing, too short, whitespace-ridden, or not an IP.
    pub invalid_identifier: u64,
    /// Mirai row with fewer columns than the layout requires.
    pub truncated_row: u64,
    /// Seen timestamp unparsable while date filtering was active.
    pub bad_timestamp: u64,
    /// Censys entry that did not decode to a JSON object.
    pub bad_record: u64,
}

impl SkipTally {
    pub fn total(&self) -> u64 {
        self.invalid_identifier + self.truncated_row + self.bad_timestamp + self.bad_record
    }

    pub fn absorb(&mut self, other: SkipTally) {
        self.invalid_identifier += other.invalid_identifier;
        self.truncated_row += other.truncated_row;
        self.bad_timestamp += other.bad_timestamp;
        self.bad_record += other.bad_record;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(ip: &str) -> MiraiRow {
        MiraiRow {
            ip: ip.to_string(),
            dst_port: "23".to_string(),
            first_seen: Some(Utc.with_ymd_and_hms(2018, 11, 1, 0, 0, 0).unwrap()),
            last_seen: Some(Utc.with_ymd_and_hms(2018, 11, 2, 12, 0, 0).unwrap()),
            asn: "4134".to_string(),
            country: "CN".to_string(),
            prefix: "1.2.3.0/24".to_string(),
        }
    }

    #[test]
    fn identifier_validation() {
        assert!(valid_identifier("1.2.3.4"));
        assert!(valid_identifier("::1"));
        assert!(!valid_identifier(""));
        assert!(!valid_identifier("  "));
        assert!(!valid_identifier("1.2.3.4 "));
        assert!(!valid_identifier("not-an-ip"));
        assert!(!valid_identifier("999.1.1.1"));
    }

    #[test]
    fn telnet_ports() {
        assert!(is_telnet_port(23));
        assert!(is_telnet_port(2323));
        assert!(!is_telnet_port(80));
        assert!(!is_telnet_port(8080));
    }

    #[test]
    fn seen_field_selects_column() {
        let r = row("1.2.3.4");
        assert_eq!(SeenField::FirstSeen.of(&r), r.first_seen);
        assert_eq!(SeenField::LastSeen.of(&r), r.last_seen);
    }

    #[test]
    fn dimension_accessors() {
        let r = row("1.2.3.4");
        assert_eq!(Dimension::Prefix.value_of(&r), "1.2.3.0/24");
        assert_eq!(Dimension::Country.value_of(&r), "CN");
        assert_eq!(Dimension::Asn.value_of(&r), "4134");
        assert_eq!(Dimension::Asn.slug(), "asn");
    }

    #[test]
    fn config_enums_deserialize_lowercase() {
        let v: CensysVersion = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(v, CensysVersion::V1);
        let s: SeenField = serde_json::from_str("\"last_seen\"").unwrap();
        assert_eq!(s, SeenField::LastSeen);
    }

    #[test]
    fn tally_totals_and_absorb() {
        let mut a = SkipTally {
            invalid_identifier: 2,
            truncated_row: 1,
            bad_timestamp: 0,
            bad_record: 3,
        };
        let b = SkipTally {
            bad_timestamp: 4,
            ..SkipTally::default()
        };
        a.absorb(b);
        assert_eq!(a.total(), 10);
        assert_eq!(a.bad_timestamp, 4);
    }
}
