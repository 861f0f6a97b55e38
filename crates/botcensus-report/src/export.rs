//! CSV emitters for every report output.
//!
//! Variable-width tables (grouped IP lists, the summary block) use a
//! flexible writer; everything is written in a deterministic order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use botcensus_core::aggregate;
use botcensus_core::duration::DescribeStats;
use botcensus_core::types::{AggregateCount, BannerGroup, IpSet};

use crate::error::Result;
use crate::report::ReportSummary;

/// `label,count` rows in ranked order.
pub fn write_counts(path: &Path, ranked: &[(String, u64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (label, count) in ranked {
        writer.write_record([label.to_string(), count.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Summary block followed by the sorted infected identifiers.
pub fn write_infected(path: &Path, summary: &ReportSummary, infected: &IpSet) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    let meta = [
        ("Number of infected devices", summary.infected.to_string()),
        (
            "Number of infected devices with banners",
            summary.with_banner.to_string(),
        ),
        (
            "Number of infected devices without banners",
            summary.without_banner.to_string(),
        ),
        ("Candidate identifiers", summary.candidates.to_string()),
        (
            "Excluded for other ports",
            summary.excluded_other_ports.to_string(),
        ),
        (
            "Skipped invalid identifiers",
            summary.skipped.invalid_identifier.to_string(),
        ),
        (
            "Skipped truncated rows",
            summary.skipped.truncated_row.to_string(),
        ),
        (
            "Skipped bad timestamps",
            summary.skipped.bad_timestamp.to_string(),
        ),
        (
            "Skipped undecodable records",
            summary.skipped.bad_record.to_string(),
        ),
    ];
    for (label, value) in meta {
        writer.write_record([label.to_string(), value])?;
    }

    let mut ips: Vec<&String> = infected.iter().collect();
    ips.sort();
    for ip in ips {
        writer.write_record([ip.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// `banner,count,ip…` rows, largest group first.
pub fn write_banner_groups(path: &Path, groups: &BannerGroup) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    let mut entries: Vec<(&String, &Vec<String>)> = groups.iter().collect();
    entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
    for (banner, ips) in entries {
        let mut row = vec![banner.clone(), ips.len().to_string()];
        row.extend(ips.iter().cloned());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// `ip,value…` rows, largest value set first.
pub fn write_ip_groups(path: &Path, groups: &BTreeMap<String, BTreeSet<String>>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    let mut entries: Vec<(&String, &BTreeSet<String>)> = groups.iter().collect();
    entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
    for (ip, values) in entries {
        let mut row = vec![ip.clone()];
        row.extend(values.iter().cloned());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Descriptive-statistics rows; an empty sample writes a lone count row.
pub fn write_duration_stats(path: &Path, stats: Option<&DescribeStats>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    match stats {
        Some(s) => {
            let rows = [
                ("count", s.count as f64),
                ("mean", s.mean),
                ("std", s.std),
                ("min", s.min),
                ("25%", s.q25),
                ("50%", s.median),
                ("75%", s.q75),
                ("max", s.max),
            ];
            for (label, value) in rows {
                writer.write_record([label.to_string(), value.to_string()])?;
            }
        }
        None => {
            writer.write_record(["count".to_string(), "0".to_string()])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// One identifier per row.
pub fn write_ip_list(path: &Path, ips: &BTreeSet<String>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for ip in ips {
        writer.write_record([ip.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// `asn,device,count` rows, each focus ASN's devices ranked.
pub fn write_asn_devices(path: &Path, per_asn: &BTreeMap<String, AggregateCount>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (asn, counts) in per_asn {
        for (device, count) in aggregate::rank(counts) {
            writer.write_record([asn.to_string(), device, count.to_string()])?;
        }
    }
    writer.flush()?;
    Ok(())
}
