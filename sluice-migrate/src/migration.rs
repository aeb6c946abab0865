//! The resolved migration record and the execution collaborator traits.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smol_str::SmolStr;

use crate::error::{MigrateResult, MigrationError};
use crate::version::{Version, compare_versions};

/// Which resolver kind produced a migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationType {
    /// A SQL script.
    Sql,
    /// A code unit that drives the connection itself.
    Code,
    /// A code unit that yields SQL statements.
    Statements,
    /// Produced by a user-supplied resolver.
    Custom(SmolStr),
}

impl MigrationType {
    /// A type tag for a user-supplied resolver.
    pub fn custom(name: impl AsRef<str>) -> Self {
        Self::Custom(SmolStr::new(name))
    }
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql => f.write_str("SQL"),
            Self::Code => f.write_str("CODE"),
            Self::Statements => f.write_str("STATEMENTS"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// A database connection as seen by executors.
///
/// Implemented by the migration runner; the resolution engine never calls it.
pub trait Connection {
    /// Execute a SQL script, which may hold several statements.
    fn execute_script(&mut self, sql: &str) -> MigrateResult<()>;
}

/// Opaque handle that applies one migration.
///
/// Resolvers attach an executor to every migration they produce; only the
/// migration runner invokes it.
pub trait MigrationExecutor: Send + Sync + fmt::Debug {
    /// Apply the migration on `connection`.
    fn execute(&self, connection: &mut dyn Connection) -> MigrateResult<()>;

    /// Whether the runner should wrap execution in a transaction.
    fn executes_in_transaction(&self) -> bool {
        true
    }
}

/// Database-specific context handed to database-aware resolvers.
pub trait DatabaseContext: Send + Sync + fmt::Debug {
    /// Dialect name, such as `postgresql`.
    fn dialect(&self) -> &str;

    /// Schema migrations are applied to, if the dialect has schemas.
    fn default_schema(&self) -> Option<&str> {
        None
    }
}

/// A migration found by a resolver.
///
/// Records are immutable once built. Two records with equal version,
/// description, script, checksum and type are exact duplicates and collapse
/// into one entry of the plan; the physical location and executor do not take
/// part in that comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMigration {
    version: Option<Version>,
    description: String,
    script: String,
    checksum: Option<i32>,
    #[serde(rename = "type")]
    migration_type: MigrationType,
    physical_location: String,
    #[serde(skip_serializing)]
    executor: Arc<dyn MigrationExecutor>,
}

impl ResolvedMigration {
    /// Start building a record.
    pub fn builder(
        description: impl Into<String>,
        migration_type: MigrationType,
    ) -> ResolvedMigrationBuilder {
        ResolvedMigrationBuilder::new(description, migration_type)
    }

    /// Version, or `None` for a repeatable migration.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Stable identifier of the artifact.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Content checksum, if known.
    pub fn checksum(&self) -> Option<i32> {
        self.checksum
    }

    /// The producing resolver kind.
    pub fn migration_type(&self) -> &MigrationType {
        &self.migration_type
    }

    /// Where the artifact came from. For diagnostics only.
    pub fn physical_location(&self) -> &str {
        &self.physical_location
    }

    /// The executor attached by the resolver.
    pub fn executor(&self) -> &Arc<dyn MigrationExecutor> {
        &self.executor
    }

    /// Check if this is a repeatable migration.
    pub fn is_repeatable(&self) -> bool {
        self.version.is_none()
    }

    /// Canonical application order: versioned migrations by version, then
    /// repeatable migrations by description.
    pub fn cmp_order(&self, other: &Self) -> Ordering {
        match compare_versions(self.version(), other.version()) {
            Ordering::Equal if self.is_repeatable() => self.description.cmp(&other.description),
            ordering => ordering,
        }
    }

    /// Check if `other` is an exact duplicate of this record.
    pub fn is_exact_duplicate(&self, other: &Self) -> bool {
        self.duplicate_key() == other.duplicate_key()
    }

    pub(crate) fn duplicate_key(&self) -> DuplicateKey<'_> {
        DuplicateKey {
            version: self.version.as_ref(),
            description: &self.description,
            script: &self.script,
            checksum: self.checksum,
            migration_type: &self.migration_type,
        }
    }

    /// Label used in logs and error messages: the version, or the description
    /// for repeatable migrations.
    pub fn label(&self) -> String {
        match &self.version {
            Some(version) => version.to_string(),
            None => format!("<< repeatable >> {}", self.description),
        }
    }
}

/// The fields that decide whether two records are exact duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DuplicateKey<'a> {
    version: Option<&'a Version>,
    description: &'a str,
    script: &'a str,
    checksum: Option<i32>,
    migration_type: &'a MigrationType,
}

/// Builder for [`ResolvedMigration`].
pub struct ResolvedMigrationBuilder {
    version: Option<Version>,
    description: String,
    script: Option<String>,
    checksum: Option<i32>,
    migration_type: MigrationType,
    physical_location: Option<String>,
    executor: Option<Arc<dyn MigrationExecutor>>,
}

impl ResolvedMigrationBuilder {
    /// Create a builder for a repeatable migration; call
    /// [`version`](Self::version) for a versioned one.
    pub fn new(description: impl Into<String>, migration_type: MigrationType) -> Self {
        Self {
            version: None,
            description: description.into(),
            script: None,
            checksum: None,
            migration_type,
            physical_location: None,
            executor: None,
        }
    }

    /// Set the version.
    pub fn version(mut self, version: Option<Version>) -> Self {
        self.version = version;
        self
    }

    /// Set the script identifier.
    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Set the checksum.
    pub fn checksum(mut self, checksum: Option<i32>) -> Self {
        self.checksum = checksum;
        self
    }

    /// Set the physical location.
    pub fn physical_location(mut self, location: impl Into<String>) -> Self {
        self.physical_location = Some(location.into());
        self
    }

    /// Set the executor.
    pub fn executor(mut self, executor: Arc<dyn MigrationExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Build the record.
    pub fn build(self) -> MigrateResult<ResolvedMigration> {
        let migration = self
            .version
            .as_ref()
            .map_or_else(|| self.description.clone(), ToString::to_string);
        if self.description.trim().is_empty() {
            return Err(MigrationError::MissingDescription { migration });
        }
        let script = self.script.ok_or_else(|| {
            MigrationError::config(format!("Script is required for migration {}", migration))
        })?;
        let physical_location = self.physical_location.ok_or_else(|| {
            MigrationError::config(format!(
                "Physical location is required for migration {}",
                migration
            ))
        })?;
        let executor = self.executor.ok_or_else(|| {
            MigrationError::config(format!("Executor is required for migration {}", migration))
        })?;

        Ok(ResolvedMigration {
            version: self.version,
            description: self.description,
            script,
            checksum: self.checksum,
            migration_type: self.migration_type,
            physical_location,
            executor,
        })
    }
}
