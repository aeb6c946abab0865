//! CLI command implementations.

pub mod resolve;
pub mod validate;
pub mod version;

use std::sync::Arc;

use sluice_migrate::{CompositeMigrationResolver, MigrationPlan, ResolverConfig, Scanner};

use crate::error::CliResult;

/// Resolve the plan for a loaded configuration using the filesystem scanner.
pub(crate) fn resolve_plan(config: ResolverConfig) -> CliResult<MigrationPlan> {
    let resolver = CompositeMigrationResolver::builder(config)
        .scanner(Arc::new(Scanner::new()))
        .build()?;
    Ok(resolver.resolve_migrations()?)
}
