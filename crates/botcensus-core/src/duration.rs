//! Activity-duration statistics for the infected set.
//!
//! Duration is the span between an IP's first and last sighting in the
//! Mirai table, in hours. One sample per IP, first table row wins.

use crate::types::{IpSet, MiraiRow};

/// Hours between first and last sighting for each infected IP.
///
/// The first table row for an IP provides its timestamps; later duplicates
/// are ignored, as are rows missing either timestamp. Sample order follows
/// first occurrence in the table.
pub fn activity_hours(table: &[MiraiRow], infected: &IpSet) -> Vec<f64> {
    let mut seen = IpSet::new();
    let mut hours = Vec::new();
    for row in table {
        if !infected.contains(&row.ip) || !seen.insert(row.ip.clone()) {
            continue;
        }
        if let (Some(first), Some(last)) = (row.first_seen, row.last_seen) {
            hours.push((last - first).num_seconds() as f64 / 3600.0);
        }
    }
    hours
}

/// Samples with the exactly-zero durations removed.
pub fn nonzero(samples: &[f64]) -> Vec<f64> {
    samples.iter().copied().filter(|h| *h != 0.0).collect()
}

/// Descriptive statistics of a sample, quantiles by linear interpolation.
///
/// `std` is the sample standard deviation, reported as 0 for fewer than two
/// samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescribeStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

pub fn describe(samples: &[f64]) -> Option<DescribeStats> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let ss = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Some(DescribeStats {
        count: n,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.50),
        q75: quantile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(ip: &str, first_hour: Option<u32>, last_hour: Option<u32>) -> MiraiRow {
        let at = |h: u32| Utc.with_ymd_and_hms(2018, 12, 1, h, 0, 0).unwrap();
        MiraiRow {
            ip: ip.to_string(),
            dst_port: "23".to_string(),
            first_seen: first_hour.map(at),
            last_seen: last_hour.map(at),
            asn: String::new(),
            country: String::new(),
            prefix: String::new(),
        }
    }

    fn infected(ips: &[&str]) -> IpSet {
        ips.iter().map(|s| s.to_string()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_row_per_ip_wins() {
        let table = vec![row("1.1.1.1", Some(0), Some(5)), row("1.1.1.1", Some(0), Some(20))];
        let hours = activity_hours(&table, &infected(&["1.1.1.1"]));
        assert_eq!(hours, vec![5.0]);
    }

    #[test]
    fn only_infected_ips_are_sampled() {
        let table = vec![row("1.1.1.1", Some(0), Some(3)), row("2.2.2.2", Some(0), Some(9))];
        let hours = activity_hours(&table, &infected(&["2.2.2.2"]));
        assert_eq!(hours, vec![9.0]);
    }

    #[test]
    fn rows_missing_timestamps_yield_no_sample() {
        let table = vec![row("1.1.1.1", None, Some(3)), row("2.2.2.2", Some(1), None)];
        let hours = activity_hours(&table, &infected(&["1.1.1.1", "2.2.2.2"]));
        assert!(hours.is_empty());
    }

    #[test]
    fn equal_timestamps_yield_a_zero_sample() {
        let table = vec![row("1.1.1.1", Some(4), Some(4))];
        let hours = activity_hours(&table, &infected(&["1.1.1.1"]));
        assert_eq!(hours, vec![0.0]);
        assert!(nonzero(&hours).is_empty());
    }

    #[test]
    fn describe_matches_hand_computed_values() {
        let samples = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = describe(&samples).unwrap();
        assert_eq!(stats.count, 8);
        assert!(close(stats.mean, 5.0));
        assert!(close(stats.std, (32.0f64 / 7.0).sqrt()));
        assert!(close(stats.min, 2.0));
        assert!(close(stats.q25, 4.0));
        assert!(close(stats.median, 4.5));
        assert!(close(stats.q75, 5.5));
        assert!(close(stats.max, 9.0));
    }

    #[test]
    fn describe_of_empty_sample_is_none() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn describe_of_singleton_has_zero_std() {
        let stats = describe(&[42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert!(close(stats.std, 0.0));
        assert!(close(stats.median, 42.0));
    }

    #[test]
    fn nonzero_drops_exact_zeros_only() {
        let filtered = nonzero(&[0.0, 1.5, 0.0, 2.0]);
        assert_eq!(filtered, vec![1.5, 2.0]);
    }
}
