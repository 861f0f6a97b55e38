//! Banner-based secondary classification of the infected set.

use crate::types::{BannerGroup, BannerMap, IpSet};

/// How many infected identifiers did and did not present a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerPresence {
    pub with_banner: usize,
    pub without_banner: usize,
}

/// Split the infected set by banner presence.
///
/// `without_banner` is the loader's set of eligible identifiers whose
/// banner was empty or absent. The two counts always sum to
/// `infected.len()`.
pub fn presence_stats(infected: &IpSet, without_banner: &IpSet) -> BannerPresence {
    let without = infected.intersection(without_banner).count();
    BannerPresence {
        with_banner: infected.len() - without,
        without_banner: without,
    }
}

/// Invert the banner map restricted to infected identifiers.
///
/// IPs lacking a banner entry are simply absent from every group. Each
/// group's IP list comes out sorted.
pub fn group_by_banner(infected: &IpSet, banners: &BannerMap) -> BannerGroup {
    let mut groups = BannerGroup::new();
    for ip in infected {
        if let Some(banner) = banners.get(ip) {
            groups.entry(banner.clone()).or_default().push(ip.clone());
        }
    }
    for ips in groups.values_mut() {
        ips.sort();
    }
    groups
}
