//! Migrations written in Rust.
//!
//! Code units are registered explicitly in a [`CodeMigrations`] registry
//! under an embedded package path. A unit either drives the connection itself
//! ([`CodeMigration`]) or yields SQL statements ([`StatementMigration`]).
//!
//! ```rust
//! use sluice_migrate::resolver::{CodeMigration, CodeMigrations, MigrationUnit};
//! use sluice_migrate::{Connection, MigrateResult};
//!
//! struct BackfillEmails;
//!
//! impl MigrationUnit for BackfillEmails {
//!     fn name(&self) -> &str {
//!         "V3__Backfill_emails"
//!     }
//! }
//!
//! impl CodeMigration for BackfillEmails {
//!     fn migrate(&self, connection: &mut dyn Connection) -> MigrateResult<()> {
//!         connection.execute_script("UPDATE users SET email = lower(email);")
//!     }
//! }
//!
//! let registry = CodeMigrations::new().with_code("db/migration", BackfillEmails);
//! assert_eq!(registry.len(), 1);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::{ConfigurationAware, MigrationResolver};
use crate::config::ResolverConfig;
use crate::error::{MigrateResult, MigrationError};
use crate::location::Location;
use crate::migration::{Connection, MigrationExecutor, MigrationType, ResolvedMigration};
use crate::naming::{NamingConvention, is_callback};
use crate::version::Version;

/// Version and description declared by a unit instead of its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfo {
    /// Version, or `None` for a repeatable migration.
    pub version: Option<Version>,
    /// Description.
    pub description: String,
}

impl MigrationInfo {
    /// A versioned migration.
    pub fn versioned(version: &str, description: impl Into<String>) -> MigrateResult<Self> {
        Ok(Self {
            version: Some(Version::parse(version)?),
            description: description.into(),
        })
    }

    /// A repeatable migration.
    pub fn repeatable(description: impl Into<String>) -> Self {
        Self {
            version: None,
            description: description.into(),
        }
    }
}

/// Common surface of every code unit.
pub trait MigrationUnit: Send + Sync {
    /// Unit name, following the naming convention unless [`info`](Self::info)
    /// is provided.
    fn name(&self) -> &str;

    /// Self-description. Takes precedence over the name.
    fn info(&self) -> Option<MigrationInfo> {
        None
    }

    /// Declared checksum.
    fn checksum(&self) -> Option<i32> {
        None
    }

    /// Whether the runner should wrap the unit in a transaction.
    fn executes_in_transaction(&self) -> bool {
        true
    }
}

/// A unit that applies itself through the connection.
pub trait CodeMigration: MigrationUnit {
    /// Apply the migration.
    fn migrate(&self, connection: &mut dyn Connection) -> MigrateResult<()>;
}

/// A unit that yields SQL statements to run in order.
pub trait StatementMigration: MigrationUnit {
    /// The statements.
    fn statements(&self) -> Vec<String>;
}

/// A unit together with where it was registered.
pub struct RegisteredUnit<U: ?Sized> {
    package: Location,
    unit: Arc<U>,
    source: String,
}

impl<U: ?Sized> RegisteredUnit<U> {
    #[track_caller]
    fn new(package: &str, unit: Arc<U>) -> Self {
        let caller = std::panic::Location::caller();
        Self {
            package: Location::embedded(
                package
                    .strip_prefix(crate::location::EMBEDDED_PREFIX)
                    .unwrap_or(package),
            ),
            unit,
            source: format!("{}:{}", caller.file(), caller.line()),
        }
    }

    /// The embedded package the unit was registered under.
    pub fn package(&self) -> &Location {
        &self.package
    }

    /// The unit.
    pub fn unit(&self) -> &Arc<U> {
        &self.unit
    }

    /// Source file and line of the registration.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn is_within(&self, location: &Location) -> bool {
        *location == self.package || location.is_parent_of(&self.package)
    }
}

impl<U: ?Sized> Clone for RegisteredUnit<U> {
    fn clone(&self) -> Self {
        Self {
            package: self.package.clone(),
            unit: Arc::clone(&self.unit),
            source: self.source.clone(),
        }
    }
}

/// Registry of code units.
#[derive(Clone, Default)]
pub struct CodeMigrations {
    code: Vec<RegisteredUnit<dyn CodeMigration>>,
    statements: Vec<RegisteredUnit<dyn StatementMigration>>,
}

impl CodeMigrations {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a [`CodeMigration`] under an embedded package path.
    #[track_caller]
    pub fn register_code(&mut self, package: &str, unit: impl CodeMigration + 'static) {
        let unit: Arc<dyn CodeMigration> = Arc::new(unit);
        self.code.push(RegisteredUnit::new(package, unit));
    }

    /// Register a [`StatementMigration`] under an embedded package path.
    #[track_caller]
    pub fn register_statements(&mut self, package: &str, unit: impl StatementMigration + 'static) {
        let unit: Arc<dyn StatementMigration> = Arc::new(unit);
        self.statements.push(RegisteredUnit::new(package, unit));
    }

    /// Register a [`CodeMigration`], builder style.
    #[track_caller]
    pub fn with_code(mut self, package: &str, unit: impl CodeMigration + 'static) -> Self {
        self.register_code(package, unit);
        self
    }

    /// Register a [`StatementMigration`], builder style.
    #[track_caller]
    pub fn with_statements(
        mut self,
        package: &str,
        unit: impl StatementMigration + 'static,
    ) -> Self {
        self.register_statements(package, unit);
        self
    }

    /// Total number of registered units.
    pub fn len(&self) -> usize {
        self.code.len() + self.statements.len()
    }

    /// Check if no units are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CodeMigrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeMigrations")
            .field("code", &self.code.iter().map(|r| r.unit.name()).collect::<Vec<_>>())
            .field(
                "statements",
                &self.statements.iter().map(|r| r.unit.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// One family of code units.
pub trait CodeKind: Send + Sync + 'static {
    /// The unit trait object.
    type Unit: ?Sized + MigrationUnit + 'static;

    /// Resolver name.
    const NAME: &'static str;

    /// Type tag of resolved migrations.
    fn migration_type() -> MigrationType;

    /// Registered units of this kind.
    fn units(registry: &CodeMigrations) -> &[RegisteredUnit<Self::Unit>];

    /// Executor applying a unit.
    fn executor(unit: &Arc<Self::Unit>) -> Arc<dyn MigrationExecutor>;
}

/// Units implementing [`CodeMigration`].
#[derive(Debug, Clone, Copy)]
pub struct Code;

impl CodeKind for Code {
    type Unit = dyn CodeMigration;

    const NAME: &'static str = "code";

    fn migration_type() -> MigrationType {
        MigrationType::Code
    }

    fn units(registry: &CodeMigrations) -> &[RegisteredUnit<Self::Unit>] {
        &registry.code
    }

    fn executor(unit: &Arc<Self::Unit>) -> Arc<dyn MigrationExecutor> {
        Arc::new(CodeExecutor {
            unit: Arc::clone(unit),
        })
    }
}

/// Units implementing [`StatementMigration`].
#[derive(Debug, Clone, Copy)]
pub struct Statements;

impl CodeKind for Statements {
    type Unit = dyn StatementMigration;

    const NAME: &'static str = "statements";

    fn migration_type() -> MigrationType {
        MigrationType::Statements
    }

    fn units(registry: &CodeMigrations) -> &[RegisteredUnit<Self::Unit>] {
        &registry.statements
    }

    fn executor(unit: &Arc<Self::Unit>) -> Arc<dyn MigrationExecutor> {
        Arc::new(StatementExecutor {
            unit: Arc::clone(unit),
        })
    }
}

struct CodeExecutor {
    unit: Arc<dyn CodeMigration>,
}

impl fmt::Debug for CodeExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeExecutor")
            .field("unit", &self.unit.name())
            .finish()
    }
}

impl MigrationExecutor for CodeExecutor {
    fn execute(&self, connection: &mut dyn Connection) -> MigrateResult<()> {
        self.unit.migrate(connection)
    }

    fn executes_in_transaction(&self) -> bool {
        self.unit.executes_in_transaction()
    }
}

struct StatementExecutor {
    unit: Arc<dyn StatementMigration>,
}

impl fmt::Debug for StatementExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementExecutor")
            .field("unit", &self.unit.name())
            .finish()
    }
}

impl MigrationExecutor for StatementExecutor {
    fn execute(&self, connection: &mut dyn Connection) -> MigrateResult<()> {
        for statement in self.unit.statements() {
            connection.execute_script(&statement)?;
        }
        Ok(())
    }

    fn executes_in_transaction(&self) -> bool {
        self.unit.executes_in_transaction()
    }
}

/// Resolves registered code units of kind `K` in embedded locations.
pub struct CodeMigrationResolver<K: CodeKind> {
    registry: Arc<CodeMigrations>,
    config: Arc<ResolverConfig>,
    /// `None` means every configured location.
    locations: Option<Vec<Location>>,
    kind: PhantomData<fn() -> K>,
}

impl<K: CodeKind> CodeMigrationResolver<K> {
    /// A resolver covering every configured location.
    pub fn new(registry: Arc<CodeMigrations>) -> Self {
        Self {
            registry,
            config: Arc::new(ResolverConfig::default()),
            locations: None,
            kind: PhantomData,
        }
    }

    /// A resolver bound to one location.
    pub fn for_location(
        location: Location,
        registry: Arc<CodeMigrations>,
        config: Arc<ResolverConfig>,
    ) -> Self {
        Self {
            config,
            locations: Some(vec![location]),
            ..Self::new(registry)
        }
    }

    fn locations(&self) -> MigrateResult<Vec<Location>> {
        match &self.locations {
            Some(locations) => Ok(locations.clone()),
            None => Ok(self.config.parsed_locations()?.iter().cloned().collect()),
        }
    }

    fn resolve_unit(&self, registered: &RegisteredUnit<K::Unit>) -> MigrateResult<ResolvedMigration> {
        let unit = registered.unit();
        let name = unit.name();

        let (version, description) = match unit.info() {
            Some(info) => {
                if info.description.trim().is_empty() {
                    let migration = info
                        .version
                        .as_ref()
                        .map_or_else(|| name.to_string(), ToString::to_string);
                    return Err(MigrationError::MissingDescription { migration });
                }
                (info.version, info.description)
            }
            None => self.extract(name)?,
        };

        let script = if registered.package().path().is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", registered.package().path(), name)
        };

        let migration = ResolvedMigration::builder(description, K::migration_type())
            .version(version)
            .script(script)
            .checksum(unit.checksum())
            .physical_location(registered.source())
            .executor(K::executor(unit))
            .build()?;

        debug!(
            version = %migration.label(),
            script = migration.script(),
            kind = K::NAME,
            "Resolved code migration"
        );
        Ok(migration)
    }

    fn extract(&self, name: &str) -> MigrateResult<(Option<Version>, String)> {
        let config = &self.config;
        let repeatable = name.starts_with(config.repeatable_sql_migration_prefix.as_str());
        if !repeatable && !name.starts_with(config.sql_migration_prefix.as_str()) {
            return Err(MigrationError::invalid_name(
                name,
                format!(
                    "code migration names must start with '{}' or '{}'",
                    config.sql_migration_prefix, config.repeatable_sql_migration_prefix
                ),
            ));
        }
        let prefix = if repeatable {
            &config.repeatable_sql_migration_prefix
        } else {
            &config.sql_migration_prefix
        };
        NamingConvention::new(prefix, &config.sql_migration_separator, "").extract(name, repeatable)
    }
}

impl<K: CodeKind> MigrationResolver for CodeMigrationResolver<K> {
    fn resolve_migrations(&self) -> MigrateResult<Vec<ResolvedMigration>> {
        let mut migrations = Vec::new();
        for location in self.locations()? {
            if !location.is_embedded() {
                continue;
            }
            for registered in K::units(&self.registry) {
                if !registered.is_within(&location) || is_callback(registered.unit().name(), "") {
                    continue;
                }
                let migration = self
                    .resolve_unit(registered)
                    .map_err(|e| MigrationError::resolver(K::NAME, &location, e))?;
                migrations.push(migration);
            }
        }
        migrations.sort_by(ResolvedMigration::cmp_order);
        Ok(migrations)
    }

    fn name(&self) -> &str {
        K::NAME
    }

    fn configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        Some(self)
    }
}

impl<K: CodeKind> ConfigurationAware for CodeMigrationResolver<K> {
    fn set_configuration(&mut self, config: Arc<ResolverConfig>) {
        self.config = config;
    }
}
