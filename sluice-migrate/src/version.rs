//! Migration versions and their ordering.
//!
//! A version is a sequence of non-negative integers written with `.` or `_`
//! between components (`1`, `1.2`, `2_0_1`). Components compare numerically
//! and a shorter version is padded with zeros, so `1` == `1.0` and
//! `1.2` < `1.10`.
//!
//! Repeatable migrations carry no version at all. At the record level this
//! is `None`, and [`compare_versions`] sorts it after every concrete version.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;

use crate::error::{MigrateResult, MigrationError};

/// A parsed migration version.
#[derive(Debug, Clone)]
pub struct Version {
    /// Components with leading zeros stripped. Never empty.
    components: Vec<SmolStr>,
    /// Canonical display form (`_` replaced by `.`).
    text: SmolStr,
}

impl Version {
    /// Parse a version string such as `1.2.10` or `1_2_10`.
    pub fn parse(text: &str) -> MigrateResult<Self> {
        let canonical = text.replace('_', ".");
        if canonical.is_empty() {
            return Err(MigrationError::invalid_version(text, "version is empty"));
        }

        let mut components = Vec::new();
        for token in canonical.split('.') {
            if token.is_empty() {
                return Err(MigrationError::invalid_version(
                    text,
                    "version contains an empty component",
                ));
            }
            if !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(MigrationError::invalid_version(
                    text,
                    format!("component '{}' is not a non-negative integer", token),
                ));
            }
            let digits = token.trim_start_matches('0');
            components.push(SmolStr::new(if digits.is_empty() { "0" } else { digits }));
        }

        Ok(Self {
            components,
            text: SmolStr::new(canonical),
        })
    }

    /// The components, without leading zeros.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(SmolStr::as_str)
    }

    /// The canonical text of this version.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Components up to the last non-zero one.
    fn significant(&self) -> &[SmolStr] {
        let end = self
            .components
            .iter()
            .rposition(|c| c != "0")
            .map_or(0, |i| i + 1);
        &self.components[..end]
    }
}

/// Compare two digit strings without leading zeros numerically.
fn cmp_component(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).map_or("0", SmolStr::as_str);
            let b = other.components.get(i).map_or("0", SmolStr::as_str);
            match cmp_component(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Compare optional versions, placing `None` (repeatable) after every version.
pub fn compare_versions(a: Option<&Version>, b: Option<&Version>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let mut versions = vec![v("10"), v("2"), v("1.10"), v("1.1"), v("1")];
        versions.sort();
        let sorted: Vec<_> = versions.iter().map(Version::as_str).collect();
        assert_eq!(sorted, vec!["1", "1.1", "1.10", "2", "10"]);
    }

    #[test]
    fn test_zero_padding() {
        assert_eq!(v("1"), v("1.0"));
        assert_eq!(v("1.0.0"), v("1"));
        assert!(v("1") < v("1.1"));
        assert!(v("1.1") < v("1.2"));
        assert!(v("1.2") < v("2"));
    }

    #[test]
    fn test_underscore_separator() {
        let version = v("1_2_3");
        assert_eq!(version.as_str(), "1.2.3");
        assert_eq!(version, v("1.2.3"));
        assert_eq!(version.components().collect::<Vec<_>>(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(v("01.002"), v("1.2"));
        assert_eq!(v("007").as_str(), "007");
    }

    #[test]
    fn test_large_components() {
        let big = v("20240101120000.99999999999999999999999");
        let bigger = v("20240101120000.100000000000000000000000");
        assert!(big < bigger);
    }

    #[test]
    fn test_hash_matches_eq() {
        let set: HashSet<Version> = [v("1"), v("1.0"), v("1.0.0"), v("2")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_invalid_versions() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse("1.a").is_err());
        assert!(Version::parse("-1").is_err());
        assert!(Version::parse("1.").is_err());
        let err = Version::parse("1.x").unwrap_err();
        assert!(err.to_string().contains("1.x"));
    }

    #[test]
    fn test_none_sorts_last() {
        let one = v("1");
        let huge = v("999999999999");
        assert_eq!(compare_versions(Some(&one), None), Ordering::Less);
        assert_eq!(compare_versions(None, Some(&huge)), Ordering::Greater);
        assert_eq!(compare_versions(None, None), Ordering::Equal);
        assert_eq!(compare_versions(Some(&one), Some(&huge)), Ordering::Less);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&v("1_5")).unwrap();
        assert_eq!(json, "\"1.5\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.5"));
        assert!(serde_json::from_str::<Version>("\"x\"").is_err());
    }
}
