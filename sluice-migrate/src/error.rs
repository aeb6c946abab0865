//! Error types for migration resolution.

// The fields are read by the derive macros.
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while resolving migrations.
#[derive(Debug, Error, Diagnostic)]
pub enum MigrationError {
    /// File system error while reading a location or artifact.
    #[error("I/O error at {path}: {source}")]
    #[diagnostic(code(sluice::migrate::io))]
    Io {
        /// Path being accessed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Artifact identifier does not follow the naming convention.
    #[error("Invalid migration name '{identifier}': {reason}")]
    #[diagnostic(code(sluice::migrate::invalid_name))]
    InvalidName {
        /// The offending filename or unit name.
        identifier: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Version string could not be parsed.
    #[error("Invalid version '{version}': {reason}")]
    #[diagnostic(
        code(sluice::migrate::invalid_version),
        help("versions may only contain digits separated by '.' or '_'")
    )]
    InvalidVersion {
        /// The raw version text.
        version: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A self-describing migration reported an empty description.
    #[error("Missing description for migration {migration}")]
    #[diagnostic(code(sluice::migrate::missing_description))]
    MissingDescription {
        /// Version or name of the migration.
        migration: String,
    },

    /// Artifact content could not be read or decoded.
    #[error("Unable to load content of {location}: {reason}")]
    #[diagnostic(code(sluice::migrate::content))]
    Content {
        /// Physical location of the artifact.
        location: String,
        /// Why loading failed.
        reason: String,
    },

    /// A resolver failed while processing one of its locations.
    #[error("Unable to resolve {resolver} migrations in location {location}: {source}")]
    #[diagnostic(code(sluice::migrate::resolver))]
    Resolver {
        /// Name of the failing resolver.
        resolver: String,
        /// The location being resolved.
        location: String,
        /// The artifact-level failure.
        #[source]
        source: Box<MigrationError>,
    },

    /// Two distinct migrations share the same version.
    #[error(
        "Found more than one migration with version {version}\nOffenders:\n-> {first_location} ({first_type})\n-> {second_location} ({second_type})"
    )]
    #[diagnostic(
        code(sluice::migrate::version_conflict),
        help("rename one of the migrations so every version is unique")
    )]
    VersionConflict {
        /// The shared version.
        version: String,
        /// Physical location of the first offender.
        first_location: String,
        /// Type of the first offender.
        first_type: String,
        /// Physical location of the second offender.
        second_location: String,
        /// Type of the second offender.
        second_type: String,
    },

    /// Two distinct repeatable migrations share the same description.
    #[error(
        "Found more than one repeatable migration with description {description}\nOffenders:\n-> {first_location} ({first_type})\n-> {second_location} ({second_type})"
    )]
    #[diagnostic(
        code(sluice::migrate::repeatable_conflict),
        help("repeatable migrations are identified by their description, which must be unique")
    )]
    RepeatableConflict {
        /// The shared description.
        description: String,
        /// Physical location of the first offender.
        first_location: String,
        /// Type of the first offender.
        first_type: String,
        /// Physical location of the second offender.
        second_location: String,
        /// Type of the second offender.
        second_type: String,
    },

    /// Location string could not be parsed.
    #[error("Invalid location: {0}")]
    #[diagnostic(code(sluice::migrate::invalid_location))]
    InvalidLocation(String),

    /// Invalid resolver configuration.
    #[error("Configuration error: {0}")]
    #[diagnostic(code(sluice::migrate::config))]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {source}")]
    #[diagnostic(code(sluice::migrate::toml))]
    Toml {
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Error raised by an executor or connection.
    #[error("Execution error: {0}")]
    #[diagnostic(code(sluice::migrate::execution))]
    Execution(String),
}

impl MigrationError {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid name error.
    pub fn invalid_name(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid version error.
    pub fn invalid_version(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a content error.
    pub fn content(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Content {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an artifact failure in a resolver-scoped error.
    pub fn resolver(
        resolver: impl Into<String>,
        location: impl std::fmt::Display,
        source: MigrationError,
    ) -> Self {
        Self::Resolver {
            resolver: resolver.into(),
            location: location.to_string(),
            source: Box::new(source),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Check if this error reports colliding migrations.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict { .. } | Self::RepeatableConflict { .. }
        )
    }

    /// Unwrap resolver wrappers down to the artifact-level cause.
    pub fn root_cause(&self) -> &MigrationError {
        match self {
            Self::Resolver { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<toml::de::Error> for MigrationError {
    fn from(source: toml::de::Error) -> Self {
        Self::Toml { source }
    }
}
