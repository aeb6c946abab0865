//! Aggregation of all resolvers into one ordered plan.

use std::cmp::Ordering;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use super::{
    Code, CodeMigrationResolver, CodeMigrations, MigrationResolver, ResolverRegistry,
    SqlMigrationResolver, Statements, inject,
};
use crate::config::ResolverConfig;
use crate::error::{MigrateResult, MigrationError};
use crate::migration::{DatabaseContext, ResolvedMigration};
use crate::placeholder::PlaceholderReplacer;
use crate::resource::{ResourceScanner, Scanner};
use crate::version::Version;

/// The resolved, ordered and conflict-free list of migrations.
///
/// Versioned migrations come first in ascending version order, followed by
/// repeatable migrations ordered by description. Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    migrations: Arc<[ResolvedMigration]>,
}

impl MigrationPlan {
    /// Iterate in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResolvedMigration> {
        self.migrations.iter()
    }

    /// Number of migrations.
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Check if the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// The migrations as a slice.
    pub fn as_slice(&self) -> &[ResolvedMigration] {
        &self.migrations
    }

    /// Versioned migrations only.
    pub fn versioned(&self) -> impl Iterator<Item = &ResolvedMigration> {
        self.iter().filter(|m| !m.is_repeatable())
    }

    /// Repeatable migrations only.
    pub fn repeatable(&self) -> impl Iterator<Item = &ResolvedMigration> {
        self.iter().filter(|m| m.is_repeatable())
    }

    /// The highest version in the plan.
    pub fn latest_version(&self) -> Option<&Version> {
        self.versioned().last().and_then(ResolvedMigration::version)
    }

    /// Find the migration with `version`.
    pub fn find(&self, version: &Version) -> Option<&ResolvedMigration> {
        self.versioned().find(|m| m.version() == Some(version))
    }
}

impl<'a> IntoIterator for &'a MigrationPlan {
    type Item = &'a ResolvedMigration;
    type IntoIter = std::slice::Iter<'a, ResolvedMigration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for MigrationPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Fans out over every configured resolver and merges the results.
///
/// The plan is computed on the first call to
/// [`resolve_migrations`](Self::resolve_migrations) and reused afterwards.
/// Concurrent first callers wait for that single pass. A failed pass is not
/// remembered, so the next call resolves again.
pub struct CompositeMigrationResolver {
    resolvers: Vec<Box<dyn MigrationResolver>>,
    plan: Mutex<Option<MigrationPlan>>,
}

impl CompositeMigrationResolver {
    /// Start building a composite resolver.
    pub fn builder(config: ResolverConfig) -> CompositeMigrationResolverBuilder {
        CompositeMigrationResolverBuilder::new(config)
    }

    /// Names of the participating resolvers, in resolution order.
    pub fn resolver_names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve every migration into a single ordered plan.
    pub fn resolve_migrations(&self) -> MigrateResult<MigrationPlan> {
        let mut cached = self.plan.lock();
        if let Some(plan) = cached.as_ref() {
            return Ok(plan.clone());
        }
        let plan = self.collect()?;
        *cached = Some(plan.clone());
        Ok(plan)
    }

    fn collect(&self) -> MigrateResult<MigrationPlan> {
        let mut all = Vec::new();
        for resolver in &self.resolvers {
            let found = resolver.resolve_migrations()?;
            debug!(resolver = resolver.name(), count = found.len(), "Resolver finished");
            all.extend(found);
        }

        let mut unique: IndexMap<_, &ResolvedMigration> = IndexMap::with_capacity(all.len());
        for migration in &all {
            match unique.entry(migration.duplicate_key()) {
                Entry::Vacant(entry) => {
                    entry.insert(migration);
                }
                Entry::Occupied(entry) => {
                    debug!(
                        script = migration.script(),
                        kept = entry.get().physical_location(),
                        discarded = migration.physical_location(),
                        "Discarding duplicate migration"
                    );
                }
            }
        }

        let mut migrations: Vec<ResolvedMigration> = unique.into_values().cloned().collect();
        migrations.sort_by(ResolvedMigration::cmp_order);
        check_conflicts(&migrations)?;

        let plan = MigrationPlan {
            migrations: migrations.into(),
        };
        info!(
            versioned = plan.versioned().count(),
            repeatable = plan.repeatable().count(),
            latest = plan.latest_version().map(Version::as_str).unwrap_or("<none>"),
            "Resolved migrations"
        );
        Ok(plan)
    }
}

fn check_conflicts(migrations: &[ResolvedMigration]) -> MigrateResult<()> {
    for pair in migrations.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if first.cmp_order(second) != Ordering::Equal {
            continue;
        }
        let first_location = first.physical_location().to_string();
        let first_type = first.migration_type().to_string();
        let second_location = second.physical_location().to_string();
        let second_type = second.migration_type().to_string();
        return Err(match first.version() {
            Some(version) => MigrationError::VersionConflict {
                version: version.to_string(),
                first_location,
                first_type,
                second_location,
                second_type,
            },
            None => MigrationError::RepeatableConflict {
                description: first.description().to_string(),
                first_location,
                first_type,
                second_location,
                second_type,
            },
        });
    }
    Ok(())
}

/// Builder for [`CompositeMigrationResolver`].
pub struct CompositeMigrationResolverBuilder {
    config: ResolverConfig,
    scanner: Option<Arc<dyn ResourceScanner>>,
    code_migrations: Arc<CodeMigrations>,
    database: Option<Arc<dyn DatabaseContext>>,
    extras: Vec<Box<dyn MigrationResolver>>,
    registry: ResolverRegistry,
}

impl CompositeMigrationResolverBuilder {
    /// Create a builder. Without a scanner only the filesystem is scanned.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            scanner: None,
            code_migrations: Arc::new(CodeMigrations::new()),
            database: None,
            extras: Vec::new(),
            registry: ResolverRegistry::new(),
        }
    }

    /// Set the resource scanner.
    pub fn scanner(mut self, scanner: Arc<dyn ResourceScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Set the registry of code units.
    pub fn code_migrations(mut self, registry: CodeMigrations) -> Self {
        self.code_migrations = Arc::new(registry);
        self
    }

    /// Set the database context handed to database-aware resolvers.
    pub fn database(mut self, database: Arc<dyn DatabaseContext>) -> Self {
        self.database = Some(database);
        self
    }

    /// Add an extra resolver. It runs once, after the default resolvers.
    pub fn resolver(mut self, resolver: impl MigrationResolver + 'static) -> Self {
        self.extras.push(Box::new(resolver));
        self
    }

    /// Add an already boxed extra resolver.
    pub fn boxed_resolver(mut self, resolver: Box<dyn MigrationResolver>) -> Self {
        self.extras.push(resolver);
        self
    }

    /// Set the registry used for the `resolvers` configuration key.
    pub fn registry(mut self, registry: ResolverRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Validate the configuration and assemble the resolvers.
    pub fn build(self) -> MigrateResult<CompositeMigrationResolver> {
        self.config.validate()?;
        let locations = self.config.parsed_locations()?;
        let config = Arc::new(self.config);
        let scanner = self
            .scanner
            .unwrap_or_else(|| Arc::new(Scanner::new()) as Arc<dyn ResourceScanner>);
        let replacer = if config.placeholder_replacement {
            Some(Arc::new(PlaceholderReplacer::from_config(&config)?))
        } else {
            None
        };

        let mut resolvers: Vec<Box<dyn MigrationResolver>> = Vec::new();
        if !config.skip_default_resolvers {
            for location in &locations {
                let mut sql = SqlMigrationResolver::for_location(
                    location.clone(),
                    Arc::clone(&scanner),
                    Arc::clone(&config),
                );
                if let Some(replacer) = &replacer {
                    sql = sql.with_placeholder_replacer(Arc::clone(replacer));
                }
                resolvers.push(Box::new(sql));
                resolvers.push(Box::new(CodeMigrationResolver::<Code>::for_location(
                    location.clone(),
                    Arc::clone(&self.code_migrations),
                    Arc::clone(&config),
                )));
                resolvers.push(Box::new(CodeMigrationResolver::<Statements>::for_location(
                    location.clone(),
                    Arc::clone(&self.code_migrations),
                    Arc::clone(&config),
                )));
            }
        }
        resolvers.extend(self.extras);
        for name in &config.resolvers {
            resolvers.push(self.registry.create(name, &config)?);
        }

        for resolver in &mut resolvers {
            inject(resolver.as_mut(), &config, self.database.as_ref());
        }

        debug!(
            locations = locations.len(),
            resolvers = resolvers.len(),
            "Built composite migration resolver"
        );
        Ok(CompositeMigrationResolver {
            resolvers,
            plan: Mutex::new(None),
        })
    }
}
