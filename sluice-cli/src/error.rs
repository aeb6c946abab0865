//! CLI error types and result alias.

// The fields are read by the derive macros.
#![allow(unused_assignments)]

use miette::Diagnostic;
use sluice_migrate::MigrationError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(sluice::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(sluice::config))]
    Config(String),

    /// Resolution failed
    #[error(transparent)]
    #[diagnostic(transparent)]
    Migration(#[from] MigrationError),

    /// Output could not be rendered
    #[error("Output error: {0}")]
    #[diagnostic(code(sluice::output))]
    Output(String),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Conflicting migrations exit with `2` so scripts can tell them apart
    /// from other failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Migration(e) if e.is_conflict() => 2,
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(format!("Failed to serialize JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let conflict = CliError::from(MigrationError::RepeatableConflict {
            description: "View".to_string(),
            first_location: "a".to_string(),
            first_type: "SQL".to_string(),
            second_location: "b".to_string(),
            second_type: "SQL".to_string(),
        });
        assert_eq!(conflict.exit_code(), 2);
        assert_eq!(CliError::Config("bad".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_migration_error_is_transparent() {
        let err = CliError::from(MigrationError::config("no locations"));
        assert_eq!(err.to_string(), "Configuration error: no locations");
    }
}
