//! Migration resolvers.
//!
//! A resolver turns the artifacts of one kind found at its locations into
//! [`ResolvedMigration`] records. The [`CompositeMigrationResolver`] fans out
//! over all resolvers and merges their output into one ordered plan.
//!
//! Resolvers that need shared settings or database details opt in through
//! [`ConfigurationAware`] and [`DatabaseContextAware`]. The composite resolver
//! injects both into every resolver that exposes the capability.

mod code;
mod composite;
mod sql;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::ResolverConfig;
use crate::error::{MigrateResult, MigrationError};
use crate::migration::{DatabaseContext, ResolvedMigration};

pub use code::{
    Code, CodeKind, CodeMigration, CodeMigrationResolver, CodeMigrations, MigrationInfo,
    MigrationUnit, RegisteredUnit, StatementMigration, Statements,
};
pub use composite::{CompositeMigrationResolver, CompositeMigrationResolverBuilder, MigrationPlan};
pub use sql::{
    FilenameExtractor, ScriptExecutorFactory, SqlExecutorFactory, SqlMigrationResolver,
    SqlScriptExecutor, VersionExtractor,
};

/// Finds migrations of one kind.
pub trait MigrationResolver: Send + Sync {
    /// Resolve every migration available to this resolver.
    ///
    /// A single bad artifact fails the whole call.
    fn resolve_migrations(&self) -> MigrateResult<Vec<ResolvedMigration>>;

    /// Short name, for diagnostics.
    fn name(&self) -> &str;

    /// Access the configuration capability, if implemented.
    fn configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        None
    }

    /// Access the database context capability, if implemented.
    fn database_aware(&mut self) -> Option<&mut dyn DatabaseContextAware> {
        None
    }
}

/// A resolver that accepts the shared configuration.
pub trait ConfigurationAware {
    /// Receive the configuration.
    fn set_configuration(&mut self, config: Arc<ResolverConfig>);
}

/// A resolver that accepts database-specific context.
pub trait DatabaseContextAware {
    /// Receive the database context.
    fn set_database_context(&mut self, database: Arc<dyn DatabaseContext>);
}

/// Hand the configuration and database context to a resolver that wants them.
pub fn inject(
    resolver: &mut dyn MigrationResolver,
    config: &Arc<ResolverConfig>,
    database: Option<&Arc<dyn DatabaseContext>>,
) {
    if let Some(aware) = resolver.configuration_aware() {
        aware.set_configuration(Arc::clone(config));
    }
    if let Some(database) = database
        && let Some(aware) = resolver.database_aware()
    {
        aware.set_database_context(Arc::clone(database));
    }
}

type ResolverFactory =
    Arc<dyn Fn(&ResolverConfig) -> MigrateResult<Box<dyn MigrationResolver>> + Send + Sync>;

/// Named resolver factories, referenced from the `resolvers` configuration key.
///
/// ```rust
/// use sluice_migrate::resolver::{MigrationResolver, ResolverRegistry};
/// use sluice_migrate::{MigrateResult, ResolvedMigration};
///
/// struct Audit;
///
/// impl MigrationResolver for Audit {
///     fn resolve_migrations(&self) -> MigrateResult<Vec<ResolvedMigration>> {
///         Ok(Vec::new())
///     }
///
///     fn name(&self) -> &str {
///         "audit"
///     }
/// }
///
/// let registry = ResolverRegistry::new().with("audit", |_| Ok(Box::new(Audit)));
/// assert!(registry.contains("audit"));
/// ```
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    factories: BTreeMap<String, ResolverFactory>,
}

impl ResolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ResolverConfig) -> MigrateResult<Box<dyn MigrationResolver>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Register a factory, builder style.
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ResolverConfig) -> MigrateResult<Box<dyn MigrationResolver>> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    /// Check if a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the resolver registered under `name`.
    pub fn create(
        &self,
        name: &str,
        config: &ResolverConfig,
    ) -> MigrateResult<Box<dyn MigrationResolver>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            let known = self.names().collect::<Vec<_>>();
            MigrationError::config(if known.is_empty() {
                format!("Unknown resolver '{}' (no resolvers are registered)", name)
            } else {
                format!(
                    "Unknown resolver '{}' (registered: {})",
                    name,
                    known.join(", ")
                )
            })
        })?;
        factory(config)
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
