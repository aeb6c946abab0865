//! Naming convention for migration artifacts.
//!
//! Versioned artifacts are named `<prefix><version><separator><description><suffix>`
//! (`V1_2__Add_table.sql`), repeatable ones `<prefix><separator><description><suffix>`
//! (`R__Refresh_view.sql`). Underscores in the version become `.`, underscores in
//! the description become spaces.

use crate::error::{MigrateResult, MigrationError};
use crate::version::Version;

/// Names of lifecycle callback scripts. Artifacts with these base names are
/// hooks, not migrations, and every resolver skips them.
pub const CALLBACK_NAMES: &[&str] = &[
    "beforeMigrate",
    "beforeEachMigrate",
    "afterEachMigrate",
    "afterMigrate",
    "beforeClean",
    "afterClean",
    "beforeInfo",
    "afterInfo",
    "beforeValidate",
    "afterValidate",
    "beforeBaseline",
    "afterBaseline",
    "beforeRepair",
    "afterRepair",
];

/// Check whether a filename names a callback script rather than a migration.
pub fn is_callback(filename: &str, suffix: &str) -> bool {
    let base = filename.strip_suffix(suffix).unwrap_or(filename);
    CALLBACK_NAMES.contains(&base)
}

/// Prefix, separator and suffix that together define how names are parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    /// Marker at the start of the name (`V`, `R`).
    pub prefix: String,
    /// Boundary between version and description (`__`).
    pub separator: String,
    /// Trailing extension to strip (`.sql`, or empty for code units).
    pub suffix: String,
}

impl NamingConvention {
    /// Create a naming convention.
    pub fn new(
        prefix: impl Into<String>,
        separator: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            suffix: suffix.into(),
        }
    }

    /// Check whether a filename starts with the prefix and ends with the suffix.
    pub fn matches(&self, filename: &str) -> bool {
        filename.len() >= self.prefix.len() + self.suffix.len()
            && filename.starts_with(&self.prefix)
            && filename.ends_with(&self.suffix)
    }

    /// An example name following this convention, used in error messages.
    pub fn example(&self, repeatable: bool) -> String {
        let version = if repeatable { "" } else { "1_2" };
        format!(
            "{}{}{}Description{}",
            self.prefix, version, self.separator, self.suffix
        )
    }

    /// Extract `(version, description)` from an identifier.
    ///
    /// Repeatable identifiers must not carry a version and yield `None`;
    /// versioned identifiers must carry one.
    pub fn extract(
        &self,
        identifier: &str,
        repeatable: bool,
    ) -> MigrateResult<(Option<Version>, String)> {
        let rest = identifier.strip_prefix(self.prefix.as_str()).ok_or_else(|| {
            MigrationError::invalid_name(
                identifier,
                format!("it must start with the configured prefix '{}'", self.prefix),
            )
        })?;
        let rest = if self.suffix.is_empty() {
            rest
        } else {
            rest.strip_suffix(self.suffix.as_str()).unwrap_or(rest)
        };

        let position = rest.find(self.separator.as_str()).ok_or_else(|| {
            MigrationError::invalid_name(
                identifier,
                format!(
                    "missing separator '{}' (it should look like this: {})",
                    self.separator,
                    self.example(repeatable)
                ),
            )
        })?;

        let raw_version = &rest[..position];
        let description = rest[position + self.separator.len()..].replace('_', " ");
        if description.trim().is_empty() {
            return Err(MigrationError::invalid_name(
                identifier,
                "the description is empty",
            ));
        }

        if raw_version.is_empty() {
            if !repeatable {
                return Err(MigrationError::invalid_name(
                    identifier,
                    format!(
                        "a versioned migration must contain a version (it should look like this: {})",
                        self.example(false)
                    ),
                ));
            }
            return Ok((None, description));
        }

        if repeatable {
            return Err(MigrationError::invalid_name(
                identifier,
                format!(
                    "a repeatable migration cannot contain a version (it should look like this: {})",
                    self.example(true)
                ),
            ));
        }

        let version = Version::parse(raw_version)
            .map_err(|e| MigrationError::invalid_name(identifier, e.to_string()))?;
        Ok((Some(version), description))
    }
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::new("V", "__", ".sql")
    }
}
