//! Integration tests for end-to-end migration resolution.
//!
//! These tests build a composite resolver over embedded resources, the
//! filesystem, code units and custom resolvers, and check the resulting plan.

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sluice_migrate::resolver::{ConfigurationAware, DatabaseContextAware};
use sluice_migrate::{
    ChecksumPolicy, CodeMigration, CodeMigrations, CompositeMigrationResolver, Connection,
    DatabaseContext, EmbeddedResources, MigrateResult, MigrationError, MigrationInfo,
    MigrationPlan, MigrationResolver, MigrationType, MigrationUnit, ResolvedMigration,
    ResolverConfig, ResolverRegistry, Scanner, SqlMigrationResolver, Version,
};
use tempfile::TempDir;

struct Unit(&'static str);

impl MigrationUnit for Unit {
    fn name(&self) -> &str {
        self.0
    }
}

impl CodeMigration for Unit {
    fn migrate(&self, connection: &mut dyn Connection) -> MigrateResult<()> {
        connection.execute_script("SELECT 1;")
    }
}

fn embedded_config() -> ResolverConfig {
    ResolverConfig::new().locations(["embedded:db/migration"])
}

fn summary(plan: &MigrationPlan) -> Vec<(Option<String>, String)> {
    plan.iter()
        .map(|m| (m.version().map(ToString::to_string), m.description().to_string()))
        .collect()
}

/// Versioned scripts sort by version, repeatables come last.
#[test]
fn test_scripts_ordered() {
    let resources = EmbeddedResources::new()
        .with("db/migration/R__Cleanup.sql", "DELETE FROM tmp;")
        .with("db/migration/V1_1__Second.sql", "ALTER TABLE a ADD b INT;")
        .with("db/migration/V1__First.sql", "CREATE TABLE a (id INT);");

    let resolver = CompositeMigrationResolver::builder(embedded_config())
        .scanner(Arc::new(resources))
        .build()
        .unwrap();
    let plan = resolver.resolve_migrations().unwrap();

    assert_eq!(
        summary(&plan),
        vec![
            (Some("1".to_string()), "First".to_string()),
            (Some("1.1".to_string()), "Second".to_string()),
            (None, "Cleanup".to_string()),
        ]
    );
    assert!(plan.iter().all(|m| m.checksum().is_some()));
}

/// Numeric comparison, not lexical.
#[test]
fn test_versions_compare_numerically() {
    let resources = EmbeddedResources::new()
        .with("db/migration/V10__Ten.sql", "SELECT 10;")
        .with("db/migration/V2__Two.sql", "SELECT 2;")
        .with("db/migration/V1_10__One_ten.sql", "SELECT 110;")
        .with("db/migration/V1_2__One_two.sql", "SELECT 12;");

    let plan = CompositeMigrationResolver::builder(embedded_config())
        .scanner(Arc::new(resources))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();

    let versions: Vec<String> = plan
        .iter()
        .filter_map(|m| m.version().map(ToString::to_string))
        .collect();
    assert_eq!(versions, vec!["1.2", "1.10", "2", "10"]);
    assert_eq!(plan.latest_version(), Some(&Version::parse("10").unwrap()));
}

/// A SQL script and a code unit claiming the same version abort resolution.
#[test]
fn test_sql_and_code_version_conflict() {
    let resources = EmbeddedResources::new()
        .with("db/migration/V2__Foo.sql", "SELECT 2;");
    let code = CodeMigrations::new().with_code("db/migration", Unit("V2__Bar"));

    let resolver = CompositeMigrationResolver::builder(embedded_config())
        .scanner(Arc::new(resources))
        .code_migrations(code)
        .build()
        .unwrap();
    let err = resolver.resolve_migrations().unwrap_err();

    assert!(err.is_conflict());
    let msg = err.to_string();
    assert!(msg.contains("version 2"), "{msg}");
    assert!(msg.contains("embedded:db/migration/V2__Foo.sql (SQL)"), "{msg}");
    assert!(msg.contains("resolution_integration.rs"), "{msg}");
    assert!(msg.contains("(CODE)"), "{msg}");
}

/// The same script found in two locations yields one migration.
#[test]
fn test_identical_scripts_in_two_locations_collapse() {
    let resources = EmbeddedResources::new()
        .with("a/V1__Same.sql", "CREATE TABLE same (id INT);")
        .with("b/V1__Same.sql", "CREATE TABLE same (id INT);");
    let config = ResolverConfig::new().locations(["embedded:a", "embedded:b"]);

    let plan = CompositeMigrationResolver::builder(config)
        .scanner(Arc::new(resources))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.as_slice()[0].physical_location(), "embedded:a/V1__Same.sql");
}

/// A copy saved with a byte order mark is still the same script.
#[test]
fn test_byte_order_mark_copy_collapses() {
    let resources = EmbeddedResources::new()
        .with("a/V1__Same.sql", "\u{feff}CREATE TABLE same (id INT);")
        .with("b/V1__Same.sql", "CREATE TABLE same (id INT);");
    let config = ResolverConfig::new().locations(["embedded:a", "embedded:b"]);

    let plan = CompositeMigrationResolver::builder(config)
        .scanner(Arc::new(resources))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.as_slice()[0].physical_location(), "embedded:a/V1__Same.sql");
}

/// Same name in two locations with different content is a conflict.
#[test]
fn test_diverging_scripts_in_two_locations_conflict() {
    let resources = EmbeddedResources::new()
        .with("a/V1__Same.sql", "CREATE TABLE same (id INT);")
        .with("b/V1__Same.sql", "CREATE TABLE same (id BIGINT);");
    let config = ResolverConfig::new().locations(["embedded:a", "embedded:b"]);

    let err = CompositeMigrationResolver::builder(config)
        .scanner(Arc::new(resources))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap_err();
    assert!(matches!(err, MigrationError::VersionConflict { .. }));
}

#[test]
fn test_empty_locations() {
    let plan = CompositeMigrationResolver::builder(embedded_config())
        .scanner(Arc::new(EmbeddedResources::new()))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_missing_filesystem_location_is_empty() {
    let dir = TempDir::new().unwrap();
    let missing = format!("filesystem:{}", dir.path().join("absent").display());
    let plan = CompositeMigrationResolver::builder(ResolverConfig::new().locations([missing]))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();
    assert!(plan.is_empty());
}

/// Filesystem and embedded sources merge into one plan.
#[test]
fn test_filesystem_and_embedded_merge() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("2024")).unwrap();
    fs::write(dir.path().join("V1__Disk.sql"), "CREATE TABLE disk (id INT);\n").unwrap();
    fs::write(dir.path().join("2024/V3__Nested.sql"), "SELECT 3;\n").unwrap();
    fs::write(dir.path().join("afterMigrate.sql"), "ANALYZE;\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let scanner = Scanner::with_embedded(
        EmbeddedResources::new().with("db/migration/V2__Embedded.sql", "SELECT 2;"),
    );
    let config = ResolverConfig::new().locations([
        format!("filesystem:{}", dir.path().display()),
        "embedded:db/migration".to_string(),
    ]);

    let plan = CompositeMigrationResolver::builder(config)
        .scanner(Arc::new(scanner))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();

    let scripts: Vec<&str> = plan.iter().map(ResolvedMigration::script).collect();
    assert_eq!(scripts, vec!["V1__Disk.sql", "V2__Embedded.sql", "2024/V3__Nested.sql"]);
}

/// Line-ending style does not change the checksum under the default policy.
#[test]
fn test_checksum_ignores_line_endings() {
    let unix = EmbeddedResources::new().with("db/migration/V1__A.sql", "SELECT 1;\nSELECT 2;\n");
    let windows =
        EmbeddedResources::new().with("db/migration/V1__A.sql", "SELECT 1;\r\nSELECT 2;\r\n");

    let checksum = |resources: EmbeddedResources| {
        CompositeMigrationResolver::builder(embedded_config())
            .scanner(Arc::new(resources))
            .build()
            .unwrap()
            .resolve_migrations()
            .unwrap()
            .as_slice()[0]
            .checksum()
    };
    assert_eq!(checksum(unix), checksum(windows));
    assert_eq!(
        checksum(EmbeddedResources::new().with("db/migration/V1__A.sql", "SELECT 1;SELECT 2;")),
        Some(ChecksumPolicy::Lines.checksum_str("SELECT 1;\nSELECT 2;"))
    );
}

#[test]
fn test_invalid_name_aborts_resolution() {
    let resources = EmbeddedResources::new()
        .with("db/migration/V1__Good.sql", "SELECT 1;")
        .with("db/migration/Vx__Bad.sql", "SELECT 2;");
    let err = CompositeMigrationResolver::builder(embedded_config())
        .scanner(Arc::new(resources))
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap_err();

    assert!(matches!(err, MigrationError::Resolver { .. }));
    assert!(err.to_string().contains("embedded:db/migration"));
    assert!(matches!(
        err.root_cause(),
        MigrationError::InvalidName { identifier, .. } if identifier == "Vx__Bad.sql"
    ));
}

struct SelfDescribed;

impl MigrationUnit for SelfDescribed {
    fn name(&self) -> &str {
        "SeedCountries"
    }

    fn info(&self) -> Option<MigrationInfo> {
        Some(MigrationInfo::repeatable("Seed countries"))
    }
}

impl CodeMigration for SelfDescribed {
    fn migrate(&self, _connection: &mut dyn Connection) -> MigrateResult<()> {
        Ok(())
    }
}

#[test]
fn test_self_described_code_unit() {
    let code = CodeMigrations::new()
        .with_code("db/migration", SelfDescribed)
        .with_code("db/migration", Unit("V1__Code_first"));
    let plan = CompositeMigrationResolver::builder(embedded_config())
        .scanner(Arc::new(EmbeddedResources::new()))
        .code_migrations(code)
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();

    assert_eq!(
        summary(&plan),
        vec![
            (Some("1".to_string()), "Code first".to_string()),
            (None, "Seed countries".to_string()),
        ]
    );
    assert_eq!(plan.as_slice()[1].migration_type(), &MigrationType::Code);
}

/// Custom resolver that records what was injected and produces one migration.
#[derive(Default)]
struct Audit {
    prefix: Option<String>,
    dialect: Option<String>,
}

impl MigrationResolver for Audit {
    fn resolve_migrations(&self) -> MigrateResult<Vec<ResolvedMigration>> {
        let dialect = self.dialect.clone().unwrap_or_else(|| "none".to_string());
        let prefix = self.prefix.clone().unwrap_or_default();
        let executor = Arc::new(AuditExecutor);
        Ok(vec![
            ResolvedMigration::builder(format!("Audit {} {}", prefix, dialect), MigrationType::custom("AUDIT"))
                .version(Some(Version::parse("100")?))
                .script("audit")
                .physical_location("audit")
                .executor(executor)
                .build()?,
        ])
    }

    fn name(&self) -> &str {
        "audit"
    }

    fn configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        Some(self)
    }

    fn database_aware(&mut self) -> Option<&mut dyn DatabaseContextAware> {
        Some(self)
    }
}

impl ConfigurationAware for Audit {
    fn set_configuration(&mut self, config: Arc<ResolverConfig>) {
        self.prefix = Some(config.sql_migration_prefix.clone());
    }
}

impl DatabaseContextAware for Audit {
    fn set_database_context(&mut self, database: Arc<dyn DatabaseContext>) {
        self.dialect = Some(database.dialect().to_string());
    }
}

#[derive(Debug)]
struct AuditExecutor;

impl sluice_migrate::MigrationExecutor for AuditExecutor {
    fn execute(&self, connection: &mut dyn Connection) -> MigrateResult<()> {
        connection.execute_script("INSERT INTO audit VALUES (now());")
    }
}

#[derive(Debug)]
struct Sqlite;

impl DatabaseContext for Sqlite {
    fn dialect(&self) -> &str {
        "sqlite"
    }
}

#[test]
fn test_extra_resolver_receives_capabilities() {
    let resolver = CompositeMigrationResolver::builder(embedded_config())
        .scanner(Arc::new(EmbeddedResources::new()))
        .database(Arc::new(Sqlite))
        .resolver(Audit::default())
        .build()
        .unwrap();
    let plan = resolver.resolve_migrations().unwrap();
    assert_eq!(plan.as_slice()[0].description(), "Audit V sqlite");
    assert_eq!(plan.as_slice()[0].migration_type().to_string(), "AUDIT");
}

#[test]
fn test_named_resolver_from_config() {
    let config = ResolverConfig::from_str(
        r#"
        locations = ["embedded:db/migration"]
        resolvers = ["audit"]
        "#,
    )
    .unwrap();
    let registry = ResolverRegistry::new().with("audit", |_| Ok(Box::new(Audit::default())));

    let resolver = CompositeMigrationResolver::builder(config)
        .scanner(Arc::new(EmbeddedResources::new()))
        .registry(registry)
        .build()
        .unwrap();
    assert_eq!(resolver.resolver_names().last(), Some(&"audit"));
    let plan = resolver.resolve_migrations().unwrap();
    assert_eq!(plan.as_slice()[0].description(), "Audit V none");
}

/// With the defaults skipped, a standalone SQL resolver still covers every
/// configured location once its configuration is injected.
#[test]
fn test_standalone_sql_resolver_as_extra() {
    let scanner = Arc::new(EmbeddedResources::new().with("db/migration/V1__Only.sql", "SELECT 1;"));
    let resolver = CompositeMigrationResolver::builder(embedded_config().skip_default_resolvers(true))
        .resolver(SqlMigrationResolver::new(scanner))
        .build()
        .unwrap();
    assert_eq!(resolver.resolver_names(), vec!["sql"]);
    assert_eq!(resolver.resolve_migrations().unwrap().len(), 1);
}

/// Nested and duplicate locations are only scanned once.
#[test]
fn test_nested_locations_scanned_once() {
    let resources = EmbeddedResources::new().with("db/migration/sub/V1__Deep.sql", "SELECT 1;");
    let config = ResolverConfig::new().locations([
        "embedded:db/migration",
        "embedded:db/migration/sub",
        "embedded:db.migration",
    ]);
    let resolver = CompositeMigrationResolver::builder(config)
        .scanner(Arc::new(resources))
        .build()
        .unwrap();
    assert_eq!(resolver.resolver_names().len(), 3);
    assert_eq!(resolver.resolve_migrations().unwrap().len(), 1);
}
