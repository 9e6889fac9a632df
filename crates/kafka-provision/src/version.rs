//! Kafka release versions and mirror index parsing

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Number of most recent releases offered for selection
pub const OFFERED_VERSIONS: usize = 10;

static INDEX_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(\d+\.\d+\.\d+)/""#).expect("index entry pattern is valid")
});

/// A `MAJOR.MINOR.PATCH` release number
///
/// Ordering compares each component numerically, so `1.2.0 < 1.10.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    fn key(self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Rejected version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{0}': expected MAJOR.MINOR.PATCH")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_string());
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, ParseVersionError> {
            let part = parts.next().ok_or_else(err)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            part.parse().map_err(|_| err())
        };
        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(version)
    }
}

/// Extract every release directory linked from the mirror's HTML listing
///
/// Result is deduplicated and sorted ascending.
pub fn parse_index(html: &str) -> Vec<Version> {
    let mut versions: Vec<Version> = INDEX_ENTRY
        .captures_iter(html)
        .filter_map(|caps| caps[1].parse().ok())
        .collect();
    versions.sort();
    versions.dedup();
    versions
}

/// Sort ascending and keep the `count` highest versions
pub fn latest(mut versions: Vec<Version>, count: usize) -> Vec<Version> {
    versions.sort();
    versions.dedup();
    let skip = versions.len().saturating_sub(count);
    versions.split_off(skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(items: &[&str]) -> Vec<Version> {
        items.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_sort_is_numeric_per_component() {
        let mut versions = parse_all(&["1.0.0", "1.2.0", "1.10.0", "0.9.9"]);
        versions.sort();

        let rendered: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["0.9.9", "1.0.0", "1.2.0", "1.10.0"]);
    }

    #[test]
    fn test_latest_keeps_ten_highest_ascending() {
        let versions: Vec<Version> = (0..15).rev().map(|m| Version::new(3, m, 0)).collect();

        let offered = latest(versions, OFFERED_VERSIONS);

        assert_eq!(offered.len(), 10);
        assert_eq!(offered.first(), Some(&Version::new(3, 5, 0)));
        assert_eq!(offered.last(), Some(&Version::new(3, 14, 0)));
        assert!(offered.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_latest_with_fewer_than_count() {
        let offered = latest(parse_all(&["2.0.0", "1.0.0"]), OFFERED_VERSIONS);
        assert_eq!(offered, parse_all(&["1.0.0", "2.0.0"]));
    }

    #[test]
    fn test_parse_index_scrapes_release_dirs() {
        let html = r#"
<a href="../">Parent Directory</a>
<a href="3.6.2/">3.6.2/</a>
<a href="3.10.0/">3.10.0/</a>
<a href="3.7.0/">3.7.0/</a>
<a href="3.7.0/">3.7.0/</a>
<a href="KEYS">KEYS</a>
<a href="4.0.0-rc1/">4.0.0-rc1/</a>
<a href="3.8/">3.8/</a>
"#;
        let versions = parse_index(html);
        assert_eq!(versions, parse_all(&["3.6.2", "3.7.0", "3.10.0"]));
    }

    #[test]
    fn test_parse_index_empty_page() {
        assert!(parse_index("<html></html>").is_empty());
    }

    #[test]
    fn test_from_str_rejects_malformed() {
        for bad in ["", "1.2", "1.2.3.4", "a.b.c", "1..2", "1.2.-3", " 1.2.3", "1.2.3-rc1"] {
            assert!(bad.parse::<Version>().is_err(), "accepted {bad:?}");
        }
        assert_eq!("3.7.10".parse(), Ok(Version::new(3, 7, 10)));
    }
}
