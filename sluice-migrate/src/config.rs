//! Resolver configuration.
//!
//! Configuration is a flat TOML table. Every key is optional:
//!
//! ```toml
//! locations = ["filesystem:db/migration", "embedded:db/migration"]
//! sql_migration_prefix = "V"
//! repeatable_sql_migration_prefix = "R"
//! sql_migration_separator = "__"
//! sql_migration_suffix = ".sql"
//! checksum_policy = "lines"
//!
//! [placeholders]
//! schema = "${APP_SCHEMA}"
//! ```
//!
//! `${VAR}` references to environment variables are expanded before parsing.

use std::collections::BTreeMap;
use std::path::Path;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::checksum::ChecksumPolicy;
use crate::error::{MigrateResult, MigrationError};
use crate::location::Locations;
use crate::naming::NamingConvention;

/// Settings shared by every resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Location descriptors to scan.
    pub locations: Vec<String>,
    /// Prefix of versioned migrations.
    pub sql_migration_prefix: String,
    /// Prefix of repeatable migrations.
    pub repeatable_sql_migration_prefix: String,
    /// Separator between version and description.
    pub sql_migration_separator: String,
    /// Suffix of SQL migration files.
    pub sql_migration_suffix: String,
    /// How SQL content is normalized before checksumming.
    pub checksum_policy: ChecksumPolicy,
    /// Only use extra and named resolvers.
    pub skip_default_resolvers: bool,
    /// Names of additional resolvers, looked up in a resolver registry.
    pub resolvers: Vec<String>,
    /// Whether SQL executors replace placeholders.
    pub placeholder_replacement: bool,
    /// Placeholder start marker.
    pub placeholder_prefix: String,
    /// Placeholder end marker.
    pub placeholder_suffix: String,
    /// Placeholder values.
    pub placeholders: BTreeMap<String, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            locations: vec!["filesystem:db/migration".to_string()],
            sql_migration_prefix: "V".to_string(),
            repeatable_sql_migration_prefix: "R".to_string(),
            sql_migration_separator: "__".to_string(),
            sql_migration_suffix: ".sql".to_string(),
            checksum_policy: ChecksumPolicy::default(),
            skip_default_resolvers: false,
            resolvers: Vec::new(),
            placeholder_replacement: true,
            placeholder_prefix: "${".to_string(),
            placeholder_suffix: "}".to_string(),
            placeholders: BTreeMap::new(),
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> MigrateResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MigrationError::io(path.display().to_string(), e))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> MigrateResult<Self> {
        let expanded = expand_env_vars(content)?;
        Ok(toml::from_str(&expanded)?)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> MigrateResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MigrationError::config(format!("unable to serialize configuration: {}", e)))
    }

    /// Set the locations to scan.
    pub fn locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Set the versioned migration prefix.
    pub fn sql_migration_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sql_migration_prefix = prefix.into();
        self
    }

    /// Set the repeatable migration prefix.
    pub fn repeatable_sql_migration_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.repeatable_sql_migration_prefix = prefix.into();
        self
    }

    /// Set the version/description separator.
    pub fn sql_migration_separator(mut self, separator: impl Into<String>) -> Self {
        self.sql_migration_separator = separator.into();
        self
    }

    /// Set the SQL file suffix.
    pub fn sql_migration_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sql_migration_suffix = suffix.into();
        self
    }

    /// Set the checksum policy for SQL content.
    pub fn checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    /// Skip the default SQL and code resolvers.
    pub fn skip_default_resolvers(mut self, skip: bool) -> Self {
        self.skip_default_resolvers = skip;
        self
    }

    /// Add a named resolver.
    pub fn resolver(mut self, name: impl Into<String>) -> Self {
        self.resolvers.push(name.into());
        self
    }

    /// Enable or disable placeholder replacement.
    pub fn placeholder_replacement(mut self, enabled: bool) -> Self {
        self.placeholder_replacement = enabled;
        self
    }

    /// Add a placeholder value.
    pub fn placeholder(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.placeholders.insert(name.into(), value.into());
        self
    }

    /// Parse and normalize the configured locations.
    pub fn parsed_locations(&self) -> MigrateResult<Locations> {
        Locations::parse(&self.locations)
    }

    /// Naming convention for versioned SQL migrations.
    pub fn versioned_naming(&self) -> NamingConvention {
        NamingConvention::new(
            &self.sql_migration_prefix,
            &self.sql_migration_separator,
            &self.sql_migration_suffix,
        )
    }

    /// Naming convention for repeatable SQL migrations.
    pub fn repeatable_naming(&self) -> NamingConvention {
        NamingConvention::new(
            &self.repeatable_sql_migration_prefix,
            &self.sql_migration_separator,
            &self.sql_migration_suffix,
        )
    }

    /// Check the configuration for settings that make resolution ambiguous.
    pub fn validate(&self) -> MigrateResult<()> {
        if self.sql_migration_prefix.is_empty() {
            return Err(MigrationError::config("sql_migration_prefix must not be empty"));
        }
        if self.repeatable_sql_migration_prefix.is_empty() {
            return Err(MigrationError::config(
                "repeatable_sql_migration_prefix must not be empty",
            ));
        }
        if self.sql_migration_separator.is_empty() {
            return Err(MigrationError::config("sql_migration_separator must not be empty"));
        }
        if self.sql_migration_prefix == self.repeatable_sql_migration_prefix {
            return Err(MigrationError::config(format!(
                "sql_migration_prefix and repeatable_sql_migration_prefix must differ (both are '{}')",
                self.sql_migration_prefix
            )));
        }
        if self.placeholder_replacement
            && (self.placeholder_prefix.is_empty() || self.placeholder_suffix.is_empty())
        {
            return Err(MigrationError::config(
                "placeholder_prefix and placeholder_suffix must not be empty",
            ));
        }
        self.parsed_locations()?;
        Ok(())
    }
}

/// Expand `${VAR}` references to set environment variables.
///
/// Unset variables are left untouched so they can still serve as
/// placeholders.
fn expand_env_vars(content: &str) -> MigrateResult<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| MigrationError::config(format!("invalid expansion pattern: {}", e)))?;
    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        if let Ok(value) = std::env::var(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }
    Ok(result)
}
