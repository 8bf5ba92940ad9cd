//! CLI command definitions and handlers

mod check;
mod classify;
mod init;
mod name;
mod policy;

use crate::config::{load_config_file, load_project_config, ProjectConfig};
use crate::maturity::MaturityLevel;
use crate::reporters::{OutputFormat, Palette};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parse a maturity level from a name (`production`) or number (`4`)
fn parse_level(s: &str) -> Result<MaturityLevel, String> {
    MaturityLevel::from_str(s).map_err(|e| e.to_string())
}

/// scaffold-gate - Generation governance for scaffolded services
#[derive(Parser, Debug)]
#[command(name = "scaffold-gate")]
#[command(
    version,
    about = "Classify project maturity, resolve service names, and gate generated source against per-level quality thresholds",
    after_help = "\
Examples:
  scaffold-gate classify --signals-file brief.toml
  scaffold-gate name --context healthcare --domain patient --type api
  scaffold-gate check --signals-file brief.toml --source-dir ./generated --service shop:orders:api
  scaffold-gate check --signals-file brief.json --source-dir . --format json
  scaffold-gate policy --policy-file policy.toml
  scaffold-gate init ./my-service

Exit codes: 0 pass, 1 gate or naming failure, 2 configuration error or cancellation"
)]
pub struct Cli {
    /// Output format: text, json (default: text, or [defaults].format from config)
    #[arg(long, short = 'f', global = true, value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Project config file (default: scaffold-gate.toml in the working or source directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a project brief into a maturity level
    #[command(after_help = "\
Examples:
  scaffold-gate classify --signals-file brief.toml
  scaffold-gate classify --signals-file brief.json --current-level production
  scaffold-gate classify --signals-file brief.json --current-level 3 --allow-downgrade")]
    Classify {
        /// Signal document (.toml or .json)
        #[arg(long, short = 's')]
        signals_file: PathBuf,

        /// Level the project currently holds; lower classifications are held there
        #[arg(long, value_parser = parse_level)]
        current_level: Option<MaturityLevel>,

        /// Accept a classification lower than --current-level
        #[arg(long, requires = "current_level")]
        allow_downgrade: bool,
    },

    /// Resolve and validate a service name
    #[command(after_help = "\
Examples:
  scaffold-gate name --context healthcare --domain patient --type api
  scaffold-gate name --context finance --domain user --type api --existing finance_user_api
  scaffold-gate name --context shop --domain orders --type worker --qualifier export --existing-file services.txt")]
    Name {
        /// Bounded context, e.g. `healthcare`
        #[arg(long)]
        context: String,

        /// Business domain, e.g. `patient`
        #[arg(long)]
        domain: String,

        /// Service type: api, bot, worker, data_api
        #[arg(long = "type", short = 't')]
        service_type: String,

        /// Qualifier used only when the short name is taken
        #[arg(long, short = 'q')]
        qualifier: Option<String>,

        /// Existing service name (repeatable)
        #[arg(long)]
        existing: Vec<String>,

        /// File with one existing service name per line
        #[arg(long)]
        existing_file: Option<PathBuf>,
    },

    /// Evaluate a generated source tree: maturity, names, and quality gates
    #[command(after_help = "\
Examples:
  scaffold-gate check --signals-file brief.toml --source-dir ./generated
  scaffold-gate check -s brief.toml --source-dir . --service shop:orders:api --service shop:orders:worker
  scaffold-gate check -s brief.toml --source-dir . --policy-file strict.toml --deadline-secs 30")]
    Check {
        /// Signal document (.toml or .json)
        #[arg(long, short = 's')]
        signals_file: PathBuf,

        /// Threshold policy (.toml or .json); built-in policy when absent
        #[arg(long, short = 'p')]
        policy_file: Option<PathBuf>,

        /// Root of the generated source tree
        #[arg(long, default_value = ".")]
        source_dir: PathBuf,

        /// Service to name, as context:domain:type[:qualifier] (repeatable)
        #[arg(long)]
        service: Vec<String>,

        /// Existing service name (repeatable)
        #[arg(long)]
        existing: Vec<String>,

        /// File with one existing service name per line
        #[arg(long)]
        existing_file: Option<PathBuf>,

        /// Level the project currently holds; gates use the higher of this and the classification
        #[arg(long, value_parser = parse_level)]
        level: Option<MaturityLevel>,

        /// Accept a classification lower than --level
        #[arg(long, requires = "level")]
        allow_downgrade: bool,

        /// Abort collection after this many seconds (exit code 2)
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Validate and print the effective threshold policy
    Policy {
        /// Threshold policy (.toml or .json); built-in policy when absent
        #[arg(long, short = 'p')]
        policy_file: Option<PathBuf>,
    },

    /// Write a commented scaffold-gate.toml and policy.toml
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

/// How a command finished, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Pass => 0,
            Outcome::Fail => 1,
        }
    }
}

/// Settings shared by every subcommand after config is applied.
pub(crate) struct Output {
    pub format: OutputFormat,
    pub palette: Palette,
}

impl Output {
    fn resolve(cli_format: Option<&str>, config: &ProjectConfig, no_color: bool) -> Result<Self> {
        let format = cli_format
            .or(config.defaults.format.as_deref())
            .map(OutputFormat::from_str)
            .transpose()?
            .unwrap_or_default();
        let color = !no_color && console::colors_enabled();
        Ok(Self {
            format,
            palette: Palette::new(color),
        })
    }

    pub fn print(&self, rendered: &str) {
        print!("{}", rendered);
        if !rendered.ends_with('\n') {
            println!();
        }
    }
}

/// Load the project config from `--config`, or from `dir` when present there.
fn project_config(explicit: Option<&Path>, dir: &Path) -> Result<ProjectConfig> {
    match explicit {
        Some(path) => load_config_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => load_project_config(dir).context("Failed to load project config"),
    }
}

/// Existing names from flags plus an optional one-name-per-line file.
fn existing_names(names: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut all = names.to_vec();
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read existing names from {}", path.display()))?;
        all.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from),
        );
    }
    Ok(all)
}

pub fn run(cli: Cli) -> Result<Outcome> {
    match cli.command {
        Commands::Init { path, force } => {
            init::run(&path, force)?;
            Ok(Outcome::Pass)
        }

        Commands::Classify {
            signals_file,
            current_level,
            allow_downgrade,
        } => {
            let config = project_config(cli.config.as_deref(), Path::new("."))?;
            let output = Output::resolve(cli.format.as_deref(), &config, cli.no_color)?;
            classify::run(&signals_file, current_level, allow_downgrade, &output)
        }

        Commands::Name {
            context,
            domain,
            service_type,
            qualifier,
            existing,
            existing_file,
        } => {
            let config = project_config(cli.config.as_deref(), Path::new("."))?;
            let output = Output::resolve(cli.format.as_deref(), &config, cli.no_color)?;
            let existing = existing_names(&existing, existing_file.as_deref())?;
            name::run(
                &config,
                &context,
                &domain,
                &service_type,
                qualifier.as_deref(),
                &existing,
                &output,
            )
        }

        Commands::Check {
            signals_file,
            policy_file,
            source_dir,
            service,
            existing,
            existing_file,
            level,
            allow_downgrade,
            deadline_secs,
        } => {
            let config = project_config(cli.config.as_deref(), &source_dir)?;
            let output = Output::resolve(cli.format.as_deref(), &config, cli.no_color)?;
            let existing = existing_names(&existing, existing_file.as_deref())?;
            check::run(
                check::CheckArgs {
                    signals_file,
                    policy_file,
                    source_dir,
                    services: service,
                    existing,
                    level,
                    allow_downgrade,
                    deadline_secs,
                },
                config,
                &output,
            )
        }

        Commands::Policy { policy_file } => {
            let config = project_config(cli.config.as_deref(), Path::new("."))?;
            let output = Output::resolve(cli.format.as_deref(), &config, cli.no_color)?;
            policy::run(policy_file.as_deref(), &config, &output)
        }
    }
}
