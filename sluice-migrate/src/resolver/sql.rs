//! SQL script migrations.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{ConfigurationAware, MigrationResolver};
use crate::checksum::{ChecksumPolicy, checksum_bytes};
use crate::config::ResolverConfig;
use crate::error::{MigrateResult, MigrationError};
use crate::location::Location;
use crate::migration::{Connection, MigrationExecutor, MigrationType, ResolvedMigration};
use crate::naming::{NamingConvention, is_callback};
use crate::placeholder::PlaceholderReplacer;
use crate::resource::{Resource, ResourceScanner};
use crate::version::Version;

/// Strategy that derives version and description from a resource.
pub trait VersionExtractor: Send + Sync + fmt::Debug {
    /// Extract `(version, description)`.
    fn extract(
        &self,
        resource: &Resource,
        naming: &NamingConvention,
        repeatable: bool,
    ) -> MigrateResult<(Option<Version>, String)>;
}

/// Parses the file name with the naming convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameExtractor;

impl VersionExtractor for FilenameExtractor {
    fn extract(
        &self,
        resource: &Resource,
        naming: &NamingConvention,
        repeatable: bool,
    ) -> MigrateResult<(Option<Version>, String)> {
        naming.extract(resource.filename(), repeatable)
    }
}

/// Creates the executor attached to each SQL migration.
pub trait SqlExecutorFactory: Send + Sync + fmt::Debug {
    /// Create an executor for `resource`.
    ///
    /// `replacer` is `None` when placeholder replacement is disabled. One
    /// replacer is shared by every script of a resolution pass.
    fn create_executor(
        &self,
        resource: &Resource,
        config: &ResolverConfig,
        replacer: Option<&Arc<PlaceholderReplacer>>,
    ) -> MigrateResult<Arc<dyn MigrationExecutor>>;
}

/// Default factory: runs the script as one unit, replacing placeholders first
/// when enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptExecutorFactory;

impl SqlExecutorFactory for ScriptExecutorFactory {
    fn create_executor(
        &self,
        resource: &Resource,
        _config: &ResolverConfig,
        replacer: Option<&Arc<PlaceholderReplacer>>,
    ) -> MigrateResult<Arc<dyn MigrationExecutor>> {
        Ok(Arc::new(SqlScriptExecutor {
            resource: resource.clone(),
            replacer: replacer.cloned(),
        }))
    }
}

/// Executes a SQL script. The content is loaded when the migration runs.
#[derive(Debug, Clone)]
pub struct SqlScriptExecutor {
    resource: Resource,
    replacer: Option<Arc<PlaceholderReplacer>>,
}

impl SqlScriptExecutor {
    /// The script as it will be sent to the database.
    pub fn prepared_sql(&self) -> MigrateResult<String> {
        let sql = self.resource.load_as_string()?;
        match &self.replacer {
            Some(replacer) => replacer.replace(&sql).map_err(|e| match e {
                MigrationError::Execution(msg) => MigrationError::execution(format!(
                    "{} ({})",
                    msg,
                    self.resource.physical_location()
                )),
                other => other,
            }),
            None => Ok(sql),
        }
    }
}

impl MigrationExecutor for SqlScriptExecutor {
    fn execute(&self, connection: &mut dyn Connection) -> MigrateResult<()> {
        let sql = self.prepared_sql()?;
        connection.execute_script(&sql)
    }
}

/// Resolves versioned and repeatable SQL scripts.
pub struct SqlMigrationResolver {
    scanner: Arc<dyn ResourceScanner>,
    config: Arc<ResolverConfig>,
    /// `None` means every configured location.
    locations: Option<Vec<Location>>,
    extractor: Arc<dyn VersionExtractor>,
    executor_factory: Arc<dyn SqlExecutorFactory>,
    /// Shared replacer for the current configuration, built on demand if unset.
    replacer: Option<Arc<PlaceholderReplacer>>,
}

impl SqlMigrationResolver {
    /// A resolver covering every configured location.
    ///
    /// Until a configuration is injected, the default configuration applies.
    pub fn new(scanner: Arc<dyn ResourceScanner>) -> Self {
        Self {
            scanner,
            config: Arc::new(ResolverConfig::default()),
            locations: None,
            extractor: Arc::new(FilenameExtractor),
            executor_factory: Arc::new(ScriptExecutorFactory),
            replacer: None,
        }
    }

    /// A resolver bound to one location.
    pub fn for_location(
        location: Location,
        scanner: Arc<dyn ResourceScanner>,
        config: Arc<ResolverConfig>,
    ) -> Self {
        Self {
            config,
            locations: Some(vec![location]),
            ..Self::new(scanner)
        }
    }

    /// Replace the version extraction strategy.
    pub fn with_extractor(mut self, extractor: Arc<dyn VersionExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the executor factory.
    pub fn with_executor_factory(mut self, factory: Arc<dyn SqlExecutorFactory>) -> Self {
        self.executor_factory = factory;
        self
    }

    /// Share a placeholder replacer built from this resolver's configuration.
    ///
    /// Injecting a different configuration later drops it.
    pub fn with_placeholder_replacer(mut self, replacer: Arc<PlaceholderReplacer>) -> Self {
        self.replacer = Some(replacer);
        self
    }

    /// The checksum policy applied to scripts.
    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.config.checksum_policy
    }

    fn locations(&self) -> MigrateResult<Vec<Location>> {
        match &self.locations {
            Some(locations) => Ok(locations.clone()),
            None => Ok(self.config.parsed_locations()?.iter().cloned().collect()),
        }
    }

    fn placeholder_replacer(&self) -> MigrateResult<Option<Arc<PlaceholderReplacer>>> {
        if !self.config.placeholder_replacement {
            return Ok(None);
        }
        match &self.replacer {
            Some(shared) => Ok(Some(Arc::clone(shared))),
            None => Ok(Some(Arc::new(PlaceholderReplacer::from_config(&self.config)?))),
        }
    }

    fn resolve_location(
        &self,
        location: &Location,
        replacer: Option<&Arc<PlaceholderReplacer>>,
        migrations: &mut Vec<ResolvedMigration>,
    ) -> MigrateResult<()> {
        let conventions = [
            (self.config.versioned_naming(), false),
            (self.config.repeatable_naming(), true),
        ];
        for (naming, repeatable) in &conventions {
            let resources =
                self.scanner
                    .scan_for_resources(location, &naming.prefix, &naming.suffix)?;
            for resource in resources {
                if is_callback(resource.filename(), &naming.suffix) {
                    debug!(script = resource.path(), "Skipping callback script");
                    continue;
                }
                migrations.push(self.resolve_resource(&resource, naming, *repeatable, replacer)?);
            }
        }
        Ok(())
    }

    fn resolve_resource(
        &self,
        resource: &Resource,
        naming: &NamingConvention,
        repeatable: bool,
        replacer: Option<&Arc<PlaceholderReplacer>>,
    ) -> MigrateResult<ResolvedMigration> {
        let (version, description) = self.extractor.extract(resource, naming, repeatable)?;
        // Line policies checksum the text as loaded, without a byte order mark.
        let checksum = match self.config.checksum_policy {
            ChecksumPolicy::RawBytes => checksum_bytes(&resource.load_bytes()?),
            policy => policy.checksum_str(&resource.load_as_string()?),
        };
        let executor = self
            .executor_factory
            .create_executor(resource, &self.config, replacer)?;

        let migration = ResolvedMigration::builder(description, MigrationType::Sql)
            .version(version)
            .script(resource.path())
            .checksum(Some(checksum))
            .physical_location(resource.physical_location())
            .executor(executor)
            .build()?;

        debug!(
            version = %migration.label(),
            script = migration.script(),
            checksum,
            "Resolved SQL migration"
        );
        Ok(migration)
    }
}

impl MigrationResolver for SqlMigrationResolver {
    fn resolve_migrations(&self) -> MigrateResult<Vec<ResolvedMigration>> {
        let replacer = self.placeholder_replacer()?;
        let mut migrations = Vec::new();
        for location in self.locations()? {
            self.resolve_location(&location, replacer.as_ref(), &mut migrations)
                .map_err(|e| MigrationError::resolver(self.name(), &location, e))?;
        }
        migrations.sort_by(ResolvedMigration::cmp_order);
        Ok(migrations)
    }

    fn name(&self) -> &str {
        "sql"
    }

    fn configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        Some(self)
    }
}

impl ConfigurationAware for SqlMigrationResolver {
    fn set_configuration(&mut self, config: Arc<ResolverConfig>) {
        if !Arc::ptr_eq(&self.config, &config) {
            self.replacer = None;
        }
        self.config = config;
    }
}
