//! Policy command - validate and print the effective threshold policy

use super::{Outcome, Output};
use crate::config::ProjectConfig;
use crate::policy::ThresholdPolicy;
use crate::reporters;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// The policy named on the command line, else the config default, else built-in.
pub(super) fn effective_policy(
    explicit: Option<&Path>,
    config: &ProjectConfig,
) -> Result<(ThresholdPolicy, String)> {
    let path: Option<PathBuf> = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.defaults.policy_file.clone());

    match path {
        Some(path) => {
            let policy = ThresholdPolicy::load(&path)
                .with_context(|| format!("Invalid threshold policy {}", path.display()))?;
            Ok((policy, path.display().to_string()))
        }
        None => Ok((ThresholdPolicy::builtin(), "builtin".to_string())),
    }
}

pub fn run(policy_file: Option<&Path>, config: &ProjectConfig, output: &Output) -> Result<Outcome> {
    let (policy, source) = effective_policy(policy_file, config)?;
    if output.format == reporters::OutputFormat::Text {
        println!("# policy: {}", source);
    }
    output.print(&reporters::policy(&policy, output.format)?);
    Ok(Outcome::Pass)
}
