//! Output reporters for scaffold-gate results
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON

mod json;
mod text;

pub use text::Palette;

use crate::maturity::{Classification, LevelTransition};
use crate::naming::{NamingError, Resolution};
use crate::policy::ThresholdPolicy;
use crate::verdict::Report;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render a check report in the specified format
pub fn report(report: &Report, format: &str) -> Result<String> {
    let fmt = OutputFormat::from_str(format)?;
    report_with_format(report, fmt, Palette::ansi())
}

/// Render a check report using an OutputFormat enum
pub fn report_with_format(report: &Report, format: OutputFormat, palette: Palette) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(report, palette),
        OutputFormat::Json => json::render(report),
    }
}

/// Classification together with the level transition it caused.
#[derive(Debug, Serialize)]
pub struct ClassifyOutcome<'a> {
    #[serde(flatten)]
    pub classification: &'a Classification,
    pub transition: &'a LevelTransition,
}

pub fn classification(
    outcome: &ClassifyOutcome<'_>,
    format: OutputFormat,
    palette: Palette,
) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_classification(outcome, palette),
        OutputFormat::Json => json::render(outcome),
    }
}

/// Outcome of a single naming request.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NameOutcome<'a> {
    Resolved(&'a Resolution),
    Rejected { error: &'a NamingError },
}

impl<'a> From<&'a Result<Resolution, NamingError>> for NameOutcome<'a> {
    fn from(result: &'a Result<Resolution, NamingError>) -> Self {
        match result {
            Ok(res) => NameOutcome::Resolved(res),
            Err(error) => NameOutcome::Rejected { error },
        }
    }
}

pub fn naming(outcome: &NameOutcome<'_>, format: OutputFormat, palette: Palette) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_naming(outcome, palette),
        OutputFormat::Json => json::render(outcome),
    }
}

/// Render the effective policy: TOML for text, JSON otherwise.
pub fn policy(policy: &ThresholdPolicy, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(policy.to_toml_string()?),
        OutputFormat::Json => json::render(policy),
    }
}
