//! # sluice-migrate
//!
//! Migration resolution engine for Sluice.
//!
//! This crate finds schema migrations and turns them into one ordered plan:
//! - Naming convention parsing (`V1_2__Add_table.sql`, `R__Refresh_view.sql`)
//! - Version comparison with zero padding (`1` == `1.0` < `1.1` < `1.10`)
//! - Content checksums (CRC-32 stored as `i32`)
//! - SQL scripts from the filesystem or embedded resources
//! - Migrations written in Rust, registered explicitly
//! - Conflict detection across all sources
//!
//! Applying the plan to a database is the job of a separate runner. The engine
//! only hands every migration an opaque [`MigrationExecutor`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐
//! │ SQL Resolver │──┐  │ Code Resolver │──┐
//! └──────────────┘  │  └───────────────┘  │
//!                   ▼                     ▼
//!             ┌────────────────────────────────┐
//!             │ Composite Resolver             │
//!             │ dedup ─▶ sort ─▶ conflict check│
//!             └────────────────────────────────┘
//!                            │
//!                            ▼
//!                    ┌────────────────┐
//!                    │ Migration Plan │
//!                    └────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sluice_migrate::{CompositeMigrationResolver, EmbeddedResources, ResolverConfig};
//!
//! let resources = EmbeddedResources::new()
//!     .with("db/migration/V1__Create_users.sql", "CREATE TABLE users (id INT);")
//!     .with("db/migration/V1_1__Add_email.sql", "ALTER TABLE users ADD email TEXT;")
//!     .with("db/migration/R__Users_view.sql", "CREATE OR REPLACE VIEW v AS SELECT 1;");
//!
//! let config = ResolverConfig::new().locations(["embedded:db/migration"]);
//! let resolver = CompositeMigrationResolver::builder(config)
//!     .scanner(Arc::new(resources))
//!     .build()?;
//!
//! let plan = resolver.resolve_migrations()?;
//! let order: Vec<_> = plan.iter().map(|m| m.description()).collect();
//! assert_eq!(order, ["Create users", "Add email", "Users view"]);
//! # Ok::<(), sluice_migrate::MigrationError>(())
//! ```
//!
//! ## Locations
//!
//! ```text
//! embedded:db/migration        resources and code units compiled into the binary
//! filesystem:/srv/migrations   a directory on disk (scanned recursively)
//! db/migration                 same as filesystem:db/migration
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod location;
pub mod migration;
pub mod naming;
pub mod placeholder;
pub mod resolver;
pub mod resource;
pub mod version;

// Re-exports
pub use checksum::{ChecksumPolicy, checksum_bytes};
pub use config::ResolverConfig;
pub use error::{MigrateResult, MigrationError};
pub use location::{Location, LocationKind, Locations};
pub use migration::{
    Connection, DatabaseContext, MigrationExecutor, MigrationType, ResolvedMigration,
    ResolvedMigrationBuilder,
};
pub use naming::{CALLBACK_NAMES, NamingConvention, is_callback};
pub use placeholder::PlaceholderReplacer;
pub use resolver::{
    CodeMigration, CodeMigrations, CompositeMigrationResolver, ConfigurationAware,
    DatabaseContextAware, MigrationInfo, MigrationPlan, MigrationResolver, MigrationUnit,
    ResolverRegistry, SqlMigrationResolver, StatementMigration,
};
pub use resource::{EmbeddedResources, FileSystemScanner, Resource, ResourceScanner, Scanner};
pub use version::{Version, compare_versions};
