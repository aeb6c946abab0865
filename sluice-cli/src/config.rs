//! CLI configuration handling.

use std::path::{Path, PathBuf};

use sluice_migrate::ResolverConfig;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "sluice.toml";

/// Load the resolver configuration.
///
/// An explicit `path` must exist. Otherwise `sluice.toml` in the current
/// directory is used when present, and the defaults when not. Non-empty
/// `locations` replace the configured ones.
pub fn load(path: Option<&Path>, locations: &[String]) -> CliResult<ResolverConfig> {
    let mut config = match config_path(path)? {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration");
            ResolverConfig::from_file(&path)?
        }
        None => {
            debug!("No configuration file, using defaults");
            ResolverConfig::default()
        }
    };

    if !locations.is_empty() {
        config.locations = locations.to_vec();
    }
    config.validate()?;
    Ok(config)
}

fn config_path(path: Option<&Path>) -> CliResult<Option<PathBuf>> {
    match path {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(CliError::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        None => {
            let default = std::env::current_dir()?.join(CONFIG_FILE_NAME);
            Ok(default.is_file().then_some(default))
        }
    }
}
