//! Core data models
//!
//! Metrics produced by the collectors and the gate results computed from
//! them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a metric measures. Declaration order is the gate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Duplication,
    Complexity,
    Maintainability,
    FileLines,
    Dependencies,
}

impl MetricKind {
    pub fn all() -> &'static [MetricKind] {
        &[
            MetricKind::Duplication,
            MetricKind::Complexity,
            MetricKind::Maintainability,
            MetricKind::FileLines,
            MetricKind::Dependencies,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Duplication => "duplication",
            MetricKind::Complexity => "complexity",
            MetricKind::Maintainability => "maintainability",
            MetricKind::FileLines => "file_lines",
            MetricKind::Dependencies => "dependencies",
        }
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            MetricKind::Duplication => MetricUnit::Percent,
            MetricKind::Complexity => MetricUnit::Count,
            MetricKind::Maintainability => MetricUnit::Index,
            MetricKind::FileLines => MetricUnit::Lines,
            MetricKind::Dependencies => MetricUnit::Count,
        }
    }

    /// Whether a higher observation is better.
    pub fn higher_is_better(&self) -> bool {
        matches!(self, MetricKind::Maintainability)
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Percent,
    Count,
    Index,
    Lines,
}

impl MetricUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            MetricUnit::Percent => "%",
            MetricUnit::Count => "",
            MetricUnit::Index => "",
            MetricUnit::Lines => " lines",
        }
    }
}

/// Where a metric was observed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum MetricScope {
    Project,
    File {
        path: PathBuf,
    },
    Function {
        path: PathBuf,
        name: String,
        line: usize,
    },
}

impl std::fmt::Display for MetricScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricScope::Project => write!(f, "project"),
            MetricScope::File { path } => write!(f, "{}", path.display()),
            MetricScope::Function { path, name, line } => {
                write!(f, "{}:{} {}", path.display(), line, name)
            }
        }
    }
}

/// One measured value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub kind: MetricKind,
    pub value: f64,
    pub unit: MetricUnit,
    #[serde(flatten)]
    pub scope: MetricScope,
}

impl Metric {
    pub fn new(kind: MetricKind, value: f64, scope: MetricScope) -> Self {
        Self {
            kind,
            value,
            unit: kind.unit(),
            scope,
        }
    }

    pub fn project(kind: MetricKind, value: f64) -> Self {
        Self::new(kind, value, MetricScope::Project)
    }

    pub fn file(kind: MetricKind, value: f64, path: impl Into<PathBuf>) -> Self {
        Self::new(kind, value, MetricScope::File { path: path.into() })
    }

    pub fn function(
        kind: MetricKind,
        value: f64,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        line: usize,
    ) -> Self {
        Self::new(
            kind,
            value,
            MetricScope::Function {
                path: path.into(),
                name: name.into(),
                line,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Passed,
    Failed,
    NotEvaluated,
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateStatus::Passed => write!(f, "passed"),
            GateStatus::Failed => write!(f, "failed"),
            GateStatus::NotEvaluated => write!(f, "not_evaluated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationHint {
    ExtractSharedCode,
    ReduceBranching,
    SplitFile,
    PruneDependencies,
    None,
}

impl RemediationHint {
    pub fn for_kind(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Duplication => RemediationHint::ExtractSharedCode,
            MetricKind::Complexity | MetricKind::Maintainability => {
                RemediationHint::ReduceBranching
            }
            MetricKind::FileLines => RemediationHint::SplitFile,
            MetricKind::Dependencies => RemediationHint::PruneDependencies,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RemediationHint::ExtractSharedCode => "extract-shared-code",
            RemediationHint::ReduceBranching => "reduce-branching",
            RemediationHint::SplitFile => "split-file",
            RemediationHint::PruneDependencies => "prune-dependencies",
            RemediationHint::None => "none",
        }
    }
}

impl std::fmt::Display for RemediationHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scope that pushed a gate over its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offender {
    #[serde(flatten)]
    pub scope: MetricScope,
    pub value: f64,
}

/// Outcome of one quality gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub metric: MetricKind,
    pub status: GateStatus,
    pub passed: bool,
    pub observed: Option<f64>,
    pub threshold: Option<f64>,
    pub remediation: RemediationHint,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offenders: Vec<Offender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl GateResult {
    pub fn is_evaluated(&self) -> bool {
        self.status != GateStatus::NotEvaluated
    }

    pub fn is_failed(&self) -> bool {
        self.status == GateStatus::Failed
    }
}
