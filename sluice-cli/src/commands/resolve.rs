//! `sluice resolve` command - Print the resolved migration plan.

use std::path::Path;

use sluice_migrate::{MigrationPlan, ResolvedMigration};

use crate::cli::{OutputFormat, ResolveArgs};
use crate::config;
use crate::error::CliResult;
use crate::output::{self, kv, style_dim};

/// Run the resolve command
pub fn run(config_path: Option<&Path>, args: ResolveArgs) -> CliResult<()> {
    let config = config::load(config_path, &args.locations)?;
    let plan = super::resolve_plan(config.clone())?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print_plan(&plan, &config.locations),
    }
    Ok(())
}

fn print_plan(plan: &MigrationPlan, locations: &[String]) {
    output::header("Migration Plan");
    kv("Locations", &locations.join(", "));
    output::newline();

    if plan.is_empty() {
        output::warn("No migrations found");
        return;
    }

    let width = plan
        .iter()
        .map(|m| version_column(m).len())
        .max()
        .unwrap_or(0);
    for migration in plan {
        println!(
            "  {:<width$}  {}  {} {}",
            version_column(migration),
            migration.description(),
            style_dim(&format!("[{}]", migration.migration_type())),
            style_dim(&checksum_column(migration)),
        );
    }

    output::newline();
    output::section("Summary");
    kv("Versioned", &plan.versioned().count().to_string());
    kv("Repeatable", &plan.repeatable().count().to_string());
    if let Some(latest) = plan.latest_version() {
        kv("Latest", latest.as_str());
    }
}

fn version_column(migration: &ResolvedMigration) -> String {
    match migration.version() {
        Some(version) => version.to_string(),
        None => "R".to_string(),
    }
}

fn checksum_column(migration: &ResolvedMigration) -> String {
    match migration.checksum() {
        Some(checksum) => format!("checksum {}", checksum),
        None => "no checksum".to_string(),
    }
}
