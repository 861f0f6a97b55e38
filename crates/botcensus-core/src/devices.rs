//! Best-effort device classification from Censys description strings.
//!
//! Descriptions are free text. Three shapes are recognized: comma-separated
//! listings (possibly one name repeated), two-word product names kept whole,
//! and longer space-separated runs where only the first token is
//! trustworthy. A lone token counts as a single name.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::types::{AggregateCount, DeviceObservation, IpSet};

/// Classifier output across every observation of an infected IP.
#[derive(Debug, Clone, Default)]
pub struct DeviceBreakdown {
    /// Unique (ip, device) pairs per device name.
    pub device_counts: AggregateCount,
    /// Device counters restricted to the configured focus ASNs.
    pub per_asn: BTreeMap<String, AggregateCount>,
    /// IPs that advertised more than one distinct device.
    pub multi_device_ips: BTreeSet<String>,
    /// ASNs hosting such IPs.
    pub multi_device_asns: BTreeSet<String>,
    /// Countries of multi-device observations, one count per counted device.
    pub multi_country_counts: AggregateCount,
    /// Observations of infected IPs carrying no usable description.
    pub missing_description: u64,
}

/// Classify device descriptions across all observations of infected IPs.
///
/// A device is counted once per (ip, name) pair no matter how many records
/// repeat it. Membership is by IP alone; the observation's own record need
/// not have been telnet-eligible.
pub fn classify(
    observations: &[DeviceObservation],
    infected: &IpSet,
    focus_asns: &[String],
) -> DeviceBreakdown {
    let focus: HashSet<&str> = focus_asns.iter().map(String::as_str).collect();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
    let mut out = DeviceBreakdown::default();

    for obs in observations {
        if !infected.contains(&obs.ip) {
            continue;
        }
        let description = match obs.description.as_deref() {
            Some(d) if !d.trim().is_empty() => d,
            _ => {
                out.missing_description += 1;
                continue;
            }
        };
        let (names, multi) = device_names(description);
        for name in names {
            if !seen_pairs.insert((obs.ip.clone(), name.clone())) {
                continue;
            }
            *out.device_counts.entry(name.clone()).or_insert(0) += 1;
            if let Some(asn) = obs.asn.as_deref() {
                if focus.contains(asn) {
                    *out
                        .per_asn
                        .entry(asn.to_string())
                        .or_default()
                        .entry(name.clone())
                        .or_insert(0) += 1;
                }
            }
            if multi {
                out.multi_device_ips.insert(obs.ip.clone());
                if let Some(asn) = &obs.asn {
                    out.multi_device_asns.insert(asn.clone());
                }
                if let Some(country) = &obs.country {
                    *out.multi_country_counts.entry(country.clone()).or_insert(0) += 1;
                }
            }
        }
    }
    out
}

/// Split one description into device names, reporting whether the record
/// advertises multiple distinct devices.
fn device_names(description: &str) -> (Vec<String>, bool) {
    let trimmed = description.trim();
    if trimmed.contains(',') {
        let mut names: Vec<String> = Vec::new();
        for token in trimmed.split(',') {
            let token = token.trim();
            if !token.is_empty() && !names.iter().any(|n| n == token) {
                names.push(token.to_string());
            }
        }
        let multi = names.len() > 1;
        return (names, multi);
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    match words.len() {
        0 => (Vec::new(), false),
        2 => (vec![trimmed.to_string()], false),
        _ => (vec![words[0].to_string()], false),
    }
}
