//! Placeholder replacement for SQL scripts.
//!
//! Scripts may reference configured values as `${name}`. Replacement happens
//! right before execution; checksums are always computed over the script as
//! written.

use std::collections::{BTreeMap, BTreeSet};

use regex_lite::{Captures, Regex};

use crate::config::ResolverConfig;
use crate::error::{MigrateResult, MigrationError};

/// Replaces placeholders in SQL text.
#[derive(Debug, Clone)]
pub struct PlaceholderReplacer {
    placeholders: BTreeMap<String, String>,
    pattern: Regex,
}

impl PlaceholderReplacer {
    /// Create a replacer for `prefix name suffix` placeholders.
    pub fn new(
        placeholders: BTreeMap<String, String>,
        prefix: &str,
        suffix: &str,
    ) -> MigrateResult<Self> {
        if prefix.is_empty() || suffix.is_empty() {
            return Err(MigrationError::config(
                "placeholder prefix and suffix must not be empty",
            ));
        }
        let pattern = format!(
            r"{}([^\r\n]+?){}",
            regex_lite::escape(prefix),
            regex_lite::escape(suffix)
        );
        let pattern = Regex::new(&pattern).map_err(|e| {
            MigrationError::config(format!("invalid placeholder delimiters: {}", e))
        })?;
        Ok(Self {
            placeholders,
            pattern,
        })
    }

    /// Create a replacer from the placeholder settings of a configuration.
    pub fn from_config(config: &ResolverConfig) -> MigrateResult<Self> {
        Self::new(
            config.placeholders.clone(),
            &config.placeholder_prefix,
            &config.placeholder_suffix,
        )
    }

    /// The configured placeholder values.
    pub fn placeholders(&self) -> &BTreeMap<String, String> {
        &self.placeholders
    }

    /// Replace every placeholder in `sql`.
    ///
    /// Fails listing all placeholders that have no configured value.
    pub fn replace(&self, sql: &str) -> MigrateResult<String> {
        let mut missing = BTreeSet::new();
        let replaced = self.pattern.replace_all(sql, |caps: &Captures<'_>| {
            let name = &caps[1];
            match self.placeholders.get(name) {
                Some(value) => value.clone(),
                None => {
                    missing.insert(name.to_string());
                    caps[0].to_string()
                }
            }
        });

        if !missing.is_empty() {
            let names = missing.into_iter().collect::<Vec<_>>().join(", ");
            return Err(MigrationError::execution(format!(
                "No value provided for placeholder(s): {}. Check your configuration!",
                names
            )));
        }
        Ok(replaced.into_owned())
    }
}
