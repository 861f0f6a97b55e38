//! Configuration for the botcensus-report pipeline.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use botcensus_core::types::{CensysVersion, FilterPolicy, SeenField};

use crate::error::{ReportError, Result};
use crate::mirai::parse_seen_timestamp;

/// Top-level report configuration.
///
/// Loaded from `botcensus.toml` `[report]` section or
/// `BOTCENSUS_REPORT__` environment variables; CLI flags override both.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Path to the Mirai CSV table.
    #[serde(default = "default_mirai_csv")]
    pub mirai_csv: String,

    /// Directory of Censys JSON record files.
    #[serde(default = "default_censys_dir")]
    pub censys_dir: String,

    /// Directory receiving every export and chart.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// File-name base for this report's outputs.
    #[serde(default = "default_base_name")]
    pub base_name: String,

    /// Censys schema generation to load.
    #[serde(default = "default_censys_version")]
    pub censys_version: CensysVersion,

    /// Keep only telnet-port rows when selecting candidates.
    #[serde(default)]
    pub filter_by_port: bool,

    /// Keep only rows seen at or after `date_limit`.
    #[serde(default)]
    pub filter_by_date: bool,

    /// Date filter threshold, `YYYY-MM-DDTHH:MM:SSZ`.
    #[serde(default = "default_date_limit")]
    pub date_limit: String,

    /// Which seen timestamp the date filter reads.
    #[serde(default = "default_seen")]
    pub seen: SeenField,

    /// Entries per chart; count exports always carry the full ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Render PNG charts next to the CSV exports.
    #[serde(default = "default_true")]
    pub charts: bool,

    /// ASNs given their own device breakdown in device mode.
    #[serde(default = "default_focus_asns")]
    pub focus_asns: Vec<String>,
}

impl ReportConfig {
    pub fn parsed_date_limit(&self) -> Result<DateTime<Utc>> {
        parse_seen_timestamp(&self.date_limit).ok_or_else(|| ReportError::DateLimit {
            value: self.date_limit.clone(),
        })
    }

    /// The filter policy this configuration describes.
    pub fn filter_policy(&self) -> Result<FilterPolicy> {
        Ok(FilterPolicy {
            by_port: self.filter_by_port,
            by_date: self.filter_by_date,
            date_limit: self.parsed_date_limit()?,
            seen: self.seen,
        })
    }
}

fn default_mirai_csv() -> String {
    "data/mirai.csv".to_string()
}

fn default_censys_dir() -> String {
    "data/censys".to_string()
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_base_name() -> String {
    "report".to_string()
}

fn default_censys_version() -> CensysVersion {
    CensysVersion::V2
}

fn default_date_limit() -> String {
    "2018-12-04T00:00:00Z".to_string()
}

fn default_seen() -> SeenField {
    SeenField::FirstSeen
}

fn default_top_n() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_focus_asns() -> Vec<String> {
    ["12389", "4837", "4134", "8452", "3462", "4766", "18403", "8376", "24444", "9121"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            mirai_csv: default_mirai_csv(),
            censys_dir: default_censys_dir(),
            output_dir: default_output_dir(),
            base_name: default_base_name(),
            censys_version: default_censys_version(),
            filter_by_port: false,
            filter_by_date: false,
            date_limit: default_date_limit(),
            seen: default_seen(),
            top_n: default_top_n(),
            charts: default_true(),
            focus_asns: default_focus_asns(),
        }
    }
}
