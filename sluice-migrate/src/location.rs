//! Migration locations.
//!
//! A location is a root that may contain migrations:
//!
//! - `embedded:db/migration` - resources compiled into the binary (see
//!   [`EmbeddedResources`](crate::resource::EmbeddedResources)) and code units
//!   registered with [`CodeMigrations`](crate::resolver::CodeMigrations).
//! - `filesystem:/srv/migrations` - a directory on disk.
//!
//! A location without a prefix is a filesystem location.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::{MigrateResult, MigrationError};

/// Prefix for embedded locations.
pub const EMBEDDED_PREFIX: &str = "embedded:";

/// Prefix for filesystem locations.
pub const FILESYSTEM_PREFIX: &str = "filesystem:";

/// The kind of root a location points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationKind {
    /// Resources and code units embedded in the binary.
    Embedded,
    /// A directory on disk.
    FileSystem,
}

/// A single migration location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    kind: LocationKind,
    path: String,
}

impl Location {
    /// Parse a location descriptor such as `embedded:db/migration`.
    pub fn parse(descriptor: &str) -> MigrateResult<Self> {
        let descriptor = descriptor.trim();
        if let Some(path) = descriptor.strip_prefix(EMBEDDED_PREFIX) {
            Ok(Self::embedded(path))
        } else if let Some(path) = descriptor.strip_prefix(FILESYSTEM_PREFIX) {
            Self::filesystem(path)
        } else if let Some((scheme, _)) = descriptor.split_once(':')
            && scheme.len() > 1
            && !scheme.contains(['/', '\\'])
        {
            Err(MigrationError::InvalidLocation(format!(
                "unknown location prefix '{}:' in '{}' (use '{}' or '{}')",
                scheme, descriptor, EMBEDDED_PREFIX, FILESYSTEM_PREFIX
            )))
        } else {
            Self::filesystem(descriptor)
        }
    }

    /// An embedded location. `.` and `/` are both accepted as separators.
    pub fn embedded(path: &str) -> Self {
        let path = path
            .split(['/', '.'])
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            kind: LocationKind::Embedded,
            path,
        }
    }

    /// A filesystem location.
    pub fn filesystem(path: &str) -> MigrateResult<Self> {
        let trimmed = path.trim_end_matches(['/', '\\']);
        let path = if trimmed.is_empty() && !path.is_empty() {
            // The filesystem root itself.
            path[..1].to_string()
        } else {
            trimmed.to_string()
        };
        if path.is_empty() {
            return Err(MigrationError::InvalidLocation(
                "filesystem location must not be empty".to_string(),
            ));
        }
        Ok(Self {
            kind: LocationKind::FileSystem,
            path,
        })
    }

    /// The root kind.
    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    /// The normalized path, without prefix.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check whether this is an embedded location.
    pub fn is_embedded(&self) -> bool {
        self.kind == LocationKind::Embedded
    }

    /// Check whether this is a filesystem location.
    pub fn is_filesystem(&self) -> bool {
        self.kind == LocationKind::FileSystem
    }

    /// Check whether this location lies strictly inside `other`.
    pub fn is_parent_of(&self, other: &Location) -> bool {
        if self.kind != other.kind || self.path == other.path {
            return false;
        }
        if self.is_embedded() && self.path.is_empty() {
            return true;
        }
        other
            .path
            .strip_prefix(self.path.as_str())
            .is_some_and(|rest| rest.starts_with('/') || self.path.ends_with('/'))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LocationKind::Embedded => write!(f, "{}{}", EMBEDDED_PREFIX, self.path),
            LocationKind::FileSystem => write!(f, "{}{}", FILESYSTEM_PREFIX, self.path),
        }
    }
}

impl FromStr for Location {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// The normalized set of configured locations.
///
/// Duplicates and locations nested inside another configured location are
/// discarded; scanning the parent already covers them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    locations: Vec<Location>,
}

impl Locations {
    /// Parse and normalize location descriptors.
    pub fn parse<S: AsRef<str>>(descriptors: &[S]) -> MigrateResult<Self> {
        let parsed = descriptors
            .iter()
            .map(|d| Location::parse(d.as_ref()))
            .collect::<MigrateResult<Vec<_>>>()?;
        Ok(Self::new(parsed))
    }

    /// Normalize already-parsed locations.
    pub fn new(candidates: Vec<Location>) -> Self {
        let mut unique: Vec<Location> = Vec::with_capacity(candidates.len());
        for location in candidates {
            if unique.contains(&location) {
                warn!(location = %location, "Discarding duplicate location");
                continue;
            }
            unique.push(location);
        }

        let locations = unique
            .iter()
            .filter(|location| {
                match unique.iter().find(|other| other.is_parent_of(location)) {
                    Some(parent) => {
                        warn!(
                            location = %location,
                            parent = %parent,
                            "Discarding location as it is a sub-location of another location"
                        );
                        false
                    }
                    None => true,
                }
            })
            .cloned()
            .collect();

        Self { locations }
    }

    /// The normalized locations, in configuration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Check if there are no locations.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl<'a> IntoIterator for &'a Locations {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
