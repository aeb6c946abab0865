//! `sluice validate` command - Check that migrations resolve cleanly.

use std::path::Path;

use crate::cli::ValidateArgs;
use crate::config;
use crate::error::CliResult;
use crate::output::{self, success};

/// Run the validate command
pub fn run(config_path: Option<&Path>, args: ValidateArgs) -> CliResult<()> {
    output::header("Validate Migrations");

    output::step(1, 2, "Loading configuration...");
    let config = config::load(config_path, &args.locations)?;

    output::step(2, 2, "Resolving migrations...");
    let plan = super::resolve_plan(config)?;

    output::newline();
    if plan.is_empty() {
        output::warn("No migrations found");
    } else {
        success(&format!(
            "{} migrations resolved without conflicts",
            plan.len()
        ));
    }
    Ok(())
}
