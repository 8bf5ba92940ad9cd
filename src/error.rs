//! Error taxonomy
//!
//! Only [`ConfigError`] stops a run. Naming problems, collector warnings and
//! gate failures are outcomes that end up in the report.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed inputs: signal sets, threshold policies, project config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required signal `{key}`")]
    MissingSignal { key: &'static str },

    #[error("signal `{key}` must be {expected}, got {found}")]
    InvalidSignal {
        key: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported document format for {} (expected .toml or .json)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid threshold policy: {0}")]
    PolicyInvariant(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl ConfigError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ConfigError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Errors that abort an evaluation run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("evaluation cancelled before all collectors finished")]
    Cancelled,
}

/// A file one collector could not handle. The file is skipped; other
/// collectors and other files are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorWarning {
    pub collector: String,
    pub path: PathBuf,
    pub message: String,
}

impl CollectorWarning {
    pub fn new(collector: &str, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            collector: collector.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CollectorWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.collector,
            self.path.display(),
            self.message
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
