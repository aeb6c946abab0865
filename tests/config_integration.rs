//! Integration tests for configuration parsing and handling.
//!
//! These tests drive resolution end to end through the `sluice` facade using
//! configurations written in TOML.

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sluice::migrate::ChecksumPolicy;
use sluice::prelude::*;
use tempfile::TempDir;

/// Test minimal configuration
#[test]
fn test_config_minimal() {
    let config = ResolverConfig::from_str("").expect("Failed to parse config");
    assert_eq!(config, ResolverConfig::default());
    assert_eq!(config.locations, vec!["filesystem:db/migration"]);
}

/// Test full configuration with all options
#[test]
fn test_config_full() {
    let config_str = r#"
        locations = ["filesystem:sql", "embedded:db/migration"]
        sql_migration_prefix = "M"
        repeatable_sql_migration_prefix = "A"
        sql_migration_separator = "--"
        sql_migration_suffix = ".psql"
        checksum_policy = "trimmed_lines"
        skip_default_resolvers = false
        resolvers = ["audit"]
        placeholder_replacement = false
        placeholder_prefix = "%{"
        placeholder_suffix = "}%"

        [placeholders]
        schema = "app"
        owner = "admin"
    "#;

    let config = ResolverConfig::from_str(config_str).expect("Failed to parse config");
    assert_eq!(config.locations.len(), 2);
    assert_eq!(config.sql_migration_prefix, "M");
    assert_eq!(config.repeatable_sql_migration_prefix, "A");
    assert_eq!(config.sql_migration_separator, "--");
    assert_eq!(config.sql_migration_suffix, ".psql");
    assert_eq!(config.checksum_policy, ChecksumPolicy::TrimmedLines);
    assert_eq!(config.resolvers, vec!["audit"]);
    assert!(!config.placeholder_replacement);
    assert_eq!(config.placeholders.get("schema").map(String::as_str), Some("app"));
    config.validate().expect("config should be valid");
}

/// Test that serialized configuration parses back unchanged
#[test]
fn test_config_to_toml() {
    let config = ResolverConfig::new()
        .locations(["filesystem:sql"])
        .placeholder("schema", "app");

    let text = config.to_toml().expect("Failed to serialize");
    let parsed = ResolverConfig::from_str(&text).expect("Failed to parse");
    assert_eq!(parsed, config);
}

/// Test that mistyped values are reported as parse errors
#[test]
fn test_config_type_error() {
    let err = ResolverConfig::from_str("locations = \"filesystem:sql\"").unwrap_err();
    assert!(err.to_string().contains("Failed to parse configuration"));
}

/// Test loading a configuration file and resolving with custom naming
#[test]
fn test_custom_naming_resolves() {
    let dir = TempDir::new().unwrap();
    let sql = dir.path().join("sql");
    fs::create_dir_all(&sql).unwrap();
    fs::write(sql.join("M1--Create.psql"), "CREATE TABLE t (id INT);").unwrap();
    fs::write(sql.join("A--Refresh.psql"), "SELECT 1;").unwrap();
    fs::write(sql.join("V2__Ignored.sql"), "SELECT 2;").unwrap();

    let config_path = dir.path().join("sluice.toml");
    fs::write(
        &config_path,
        format!(
            r#"
            locations = ["filesystem:{}"]
            sql_migration_prefix = "M"
            repeatable_sql_migration_prefix = "A"
            sql_migration_separator = "--"
            sql_migration_suffix = ".psql"
            "#,
            sql.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();

    let config = ResolverConfig::from_file(&config_path).unwrap();
    let plan = CompositeMigrationResolver::builder(config)
        .build()
        .unwrap()
        .resolve_migrations()
        .unwrap();

    let labels: Vec<String> = plan.iter().map(|m| m.label()).collect();
    assert_eq!(labels, vec!["1", "<< repeatable >> Refresh"]);
}

/// Test that the checksum policy in configuration reaches the SQL resolver
#[test]
fn test_checksum_policy_applies() {
    let embedded = || {
        EmbeddedResources::new().with("db/migration/V1__Init.sql", "  SELECT 1;  \n")
    };
    let resolve = |policy: ChecksumPolicy| {
        let config = ResolverConfig::new()
            .locations(["embedded:db/migration"])
            .checksum_policy(policy);
        CompositeMigrationResolver::builder(config)
            .scanner(Arc::new(Scanner::with_embedded(embedded())))
            .build()
            .unwrap()
            .resolve_migrations()
            .unwrap()
    };

    let trimmed = resolve(ChecksumPolicy::TrimmedLines);
    let lines = resolve(ChecksumPolicy::Lines);
    assert_eq!(
        trimmed.as_slice()[0].checksum(),
        Some(sluice::migrate::checksum_bytes(b"SELECT 1;"))
    );
    assert_ne!(trimmed.as_slice()[0].checksum(), lines.as_slice()[0].checksum());
}
