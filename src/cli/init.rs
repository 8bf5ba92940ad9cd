//! Init command - write starter config and policy files

use crate::config::CONFIG_FILE_NAME;
use crate::policy::ThresholdPolicy;
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

const POLICY_FILE_NAME: &str = "policy.toml";

const DEFAULT_CONFIG: &str = r#"# scaffold-gate configuration

[naming]
# Names longer than this produce a warning (never an error)
soft_length_limit = 40

# Extra reserved words, on top of the built-in list
# (service, svc, template, shared, common, test, tmp, misc, new, old)
reserved = []

[collectors]
# Consecutive tokens that must repeat before code counts as duplicated
duplication_min_tokens = 50

# Paths skipped by all collectors, in addition to .gitignore
exclude = ["vendor/", "node_modules/"]

[defaults]
# Output format when --format is not given (text, json)
format = "text"

# Threshold policy used when --policy-file is not given
policy_file = "policy.toml"
"#;

const POLICY_HEADER: &str = r#"# scaffold-gate threshold policy
#
# One table per maturity level: poc, development, pre_production, production.
# Leave a field out to skip that gate at that level.
# Higher levels may not raise duplication_max_pct or complexity_max,
# and may not lower dependency_max.

"#;

/// Run the init command
pub fn run(path: &Path, force: bool) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    let dir = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    println!("\n{} Initializing scaffold-gate\n", style("▸").bold());

    let policy = format!("{}{}", POLICY_HEADER, ThresholdPolicy::builtin().to_toml_string()?);
    write_file(&dir, CONFIG_FILE_NAME, DEFAULT_CONFIG, force)?;
    write_file(&dir, POLICY_FILE_NAME, &policy, force)?;

    println!("\nNext steps:");
    println!(
        "  {} Classify a project brief",
        style("scaffold-gate classify --signals-file brief.toml").cyan()
    );
    println!(
        "  {} Gate generated code",
        style("scaffold-gate check --signals-file brief.toml --source-dir .").cyan()
    );

    Ok(())
}

fn write_file(dir: &Path, name: &str, content: &str, force: bool) -> Result<()> {
    let path = dir.join(name);
    if path.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            style("•").yellow(),
            style(name).cyan()
        );
        return Ok(());
    }
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} Created {}", style("✓").green(), style(name).cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_project_config;

    #[test]
    fn test_init_writes_loadable_files() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), false).unwrap();

        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.collectors.duplication_min_tokens, 50);
        assert_eq!(config.defaults.format.as_deref(), Some("text"));

        let policy_path = config.defaults.policy_file.unwrap();
        assert_eq!(policy_path, dir.path().join(POLICY_FILE_NAME));
        let policy = ThresholdPolicy::load(&policy_path).unwrap();
        assert_eq!(policy, ThresholdPolicy::builtin());
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "# mine\n").unwrap();

        run(dir.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "# mine\n");

        run(dir.path(), true).unwrap();
        assert!(std::fs::read_to_string(&config_path)
            .unwrap()
            .contains("[collectors]"));
    }
}
