//! Intersection of the Mirai candidate set with the Censys eligible set.

use crate::types::IpSet;

/// Identifiers present in both sets: the infected set.
///
/// Pure and symmetric; neither argument is consumed or mutated. Walks the
/// smaller set and probes the larger one.
pub fn intersect(a: &IpSet, b: &IpSet) -> IpSet {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter(|ip| large.contains(*ip))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ips: &[&str]) -> IpSet {
        ips.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_common_identifiers_only() {
        let a = set(&["1.1.1.1", "2.2.2.2", "3.3.3.3"]);
        let b = set(&["2.2.2.2", "3.3.3.3", "4.4.4.4"]);
        assert_eq!(intersect(&a, &b), set(&["2.2.2.2", "3.3.3.3"]));
    }

    #[test]
    fn is_symmetric() {
        let a = set(&["1.1.1.1", "2.2.2.2"]);
        let b = set(&["2.2.2.2", "9.9.9.9", "8.8.8.8"]);
        assert_eq!(intersect(&a, &b), intersect(&b, &a));
    }

    #[test]
    fn leaves_arguments_untouched() {
        let a = set(&["1.1.1.1", "2.2.2.2"]);
        let b = set(&["2.2.2.2"]);
        let _ = intersect(&a, &b);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn empty_side_yields_empty() {
        let a = set(&["1.1.1.1"]);
        assert!(intersect(&a, &IpSet::new()).is_empty());
        assert!(intersect(&IpSet::new(), &a).is_empty());
    }
}
