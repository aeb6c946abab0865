//! # Sluice
//!
//! Discovers schema migrations from many sources and merges them into one
//! validated, ordered plan.
//!
//! Sluice provides:
//! - SQL script discovery on the filesystem and in embedded resources
//! - Compiled-in code and statement migrations registered by package
//! - Pluggable resolvers, created by name from configuration
//! - Conflict detection for duplicate versions and repeatable descriptions
//!
//! ## Quick Start
//!
//! ```rust
//! use sluice::prelude::*;
//!
//! let embedded = EmbeddedResources::new()
//!     .with("db/migration/V1__Create_users.sql", "CREATE TABLE users (id INT);")
//!     .with("db/migration/R__Users_view.sql", "CREATE VIEW v AS SELECT 1;");
//!
//! let config = ResolverConfig::new().locations(["embedded:db/migration"]);
//! let resolver = CompositeMigrationResolver::builder(config)
//!     .scanner(std::sync::Arc::new(Scanner::with_embedded(embedded)))
//!     .build()?;
//!
//! let plan = resolver.resolve_migrations()?;
//! assert_eq!(plan.len(), 2);
//! assert!(plan.iter().last().is_some_and(|m| m.is_repeatable()));
//! # Ok::<(), MigrationError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Migration resolution engine.
pub mod migrate {
    pub use sluice_migrate::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        CodeMigration, CodeMigrations, CompositeMigrationResolver, EmbeddedResources,
        MigrateResult, MigrationError, MigrationInfo, MigrationPlan, MigrationResolver,
        MigrationType, MigrationUnit, ResolvedMigration, ResolverConfig, ResolverRegistry,
        Scanner, StatementMigration, Version,
    };
}

// Re-export key types at the crate root
pub use migrate::{MigrationError, MigrationPlan, ResolverConfig};
