//! Threshold policy
//!
//! Quality gate thresholds per maturity level. Thresholds are data: a policy
//! comes from a document or from [`ThresholdPolicy::builtin`], never from
//! constants scattered through the evaluator.
//!
//! ```toml
//! version = 1
//!
//! [levels.development]
//! duplication_max_pct = 10.0
//! complexity_max = 10
//! maintainability_min = 20.0
//! file_lines_max = 400
//! dependency_max = 20
//! ```
//!
//! Stricter levels must not loosen quality limits, and may only allow more
//! dependencies. Violations are rejected at load time.

use crate::config::load_document;
use crate::error::{ConfigError, ConfigResult};
use crate::maturity::MaturityLevel;
use crate::models::MetricKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

pub const POLICY_VERSION: u32 = 1;

/// Thresholds for one maturity level. Absent fields are not gated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelThresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplication_max_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainability_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_lines_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_max: Option<u32>,
}

impl LevelThresholds {
    /// Threshold for a metric kind, as compared against observations.
    pub fn threshold(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Duplication => self.duplication_max_pct,
            MetricKind::Complexity => self.complexity_max.map(f64::from),
            MetricKind::Maintainability => self.maintainability_min,
            MetricKind::FileLines => self.file_lines_max.map(f64::from),
            MetricKind::Dependencies => self.dependency_max.map(f64::from),
        }
    }
}

/// A complete threshold policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyDocument", into = "PolicyDocument")]
pub struct ThresholdPolicy {
    pub version: u32,
    pub levels: BTreeMap<MaturityLevel, LevelThresholds>,
}

/// On-disk shape: level tables keyed by name.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    pub version: u32,
    #[serde(default)]
    pub levels: BTreeMap<String, LevelThresholds>,
}

impl TryFrom<PolicyDocument> for ThresholdPolicy {
    type Error = String;

    fn try_from(doc: PolicyDocument) -> Result<Self, Self::Error> {
        let mut levels = BTreeMap::new();
        for (key, thresholds) in doc.levels {
            let level: MaturityLevel = key.parse().map_err(|e: ConfigError| e.to_string())?;
            if levels.insert(level, thresholds).is_some() {
                return Err(format!("level '{}' defined more than once", level.key()));
            }
        }
        Ok(Self {
            version: doc.version,
            levels,
        })
    }
}

impl From<ThresholdPolicy> for PolicyDocument {
    fn from(policy: ThresholdPolicy) -> Self {
        Self {
            version: policy.version,
            levels: policy
                .levels
                .into_iter()
                .map(|(level, t)| (level.key().to_string(), t))
                .collect(),
        }
    }
}

impl ThresholdPolicy {
    /// Built-in default policy.
    pub fn builtin() -> Self {
        let level = |dup: f64, cx: u32, mi: f64, lines: u32, deps: u32| LevelThresholds {
            duplication_max_pct: Some(dup),
            complexity_max: Some(cx),
            maintainability_min: Some(mi),
            file_lines_max: Some(lines),
            dependency_max: Some(deps),
        };

        let mut levels = BTreeMap::new();
        levels.insert(MaturityLevel::Poc, level(15.0, 15, 10.0, 500, 15));
        levels.insert(MaturityLevel::Development, level(10.0, 10, 20.0, 400, 20));
        levels.insert(MaturityLevel::PreProduction, level(5.0, 10, 20.0, 400, 30));
        levels.insert(MaturityLevel::Production, level(3.0, 10, 20.0, 400, 40));

        Self {
            version: POLICY_VERSION,
            levels,
        }
    }

    /// Load and validate a policy document (`.toml` or `.json`).
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let policy: ThresholdPolicy = load_document(path)?;
        policy.validate()?;
        debug!(
            "Loaded threshold policy from {} ({} levels)",
            path.display(),
            policy.levels.len()
        );
        Ok(policy)
    }

    /// Parse a TOML policy from a string.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let policy: ThresholdPolicy = toml::from_str(content)
            .map_err(|e| ConfigError::parse("<policy>", e))?;
        policy.validate()?;
        Ok(policy)
    }

    /// The thresholds for `level`, if the policy defines that level.
    pub fn for_level(&self, level: MaturityLevel) -> Option<&LevelThresholds> {
        self.levels.get(&level)
    }

    /// Check versions, ranges and cross-level ordering.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.version != POLICY_VERSION {
            return Err(ConfigError::PolicyInvariant(format!(
                "unsupported policy version {} (expected {})",
                self.version, POLICY_VERSION
            )));
        }

        for (level, t) in &self.levels {
            check_percent(*level, "duplication_max_pct", t.duplication_max_pct)?;
            check_percent(*level, "maintainability_min", t.maintainability_min)?;
            check_count(*level, "complexity_max", t.complexity_max)?;
            check_count(*level, "file_lines_max", t.file_lines_max)?;
            check_count(*level, "dependency_max", t.dependency_max)?;
        }

        // BTreeMap iterates levels in ascending order
        let levels: Vec<(&MaturityLevel, &LevelThresholds)> = self.levels.iter().collect();
        for (i, (lower, a)) in levels.iter().enumerate() {
            for (higher, b) in &levels[i + 1..] {
                check_order(
                    **lower,
                    **higher,
                    "dependency_max",
                    a.dependency_max,
                    b.dependency_max,
                    Direction::NonDecreasing,
                )?;
                check_order(
                    **lower,
                    **higher,
                    "duplication_max_pct",
                    a.duplication_max_pct,
                    b.duplication_max_pct,
                    Direction::NonIncreasing,
                )?;
                check_order(
                    **lower,
                    **higher,
                    "complexity_max",
                    a.complexity_max,
                    b.complexity_max,
                    Direction::NonIncreasing,
                )?;
            }
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue(format!("cannot render policy: {}", e)))
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

fn check_percent(level: MaturityLevel, field: &str, value: Option<f64>) -> ConfigResult<()> {
    match value {
        Some(v) if !(0.0..=100.0).contains(&v) => {
            Err(ConfigError::PolicyInvariant(format!(
                "{}.{} must be within 0..=100, got {}",
                level.key(),
                field,
                v
            )))
        }
        _ => Ok(()),
    }
}

fn check_count(level: MaturityLevel, field: &str, value: Option<u32>) -> ConfigResult<()> {
    match value {
        Some(0) => Err(ConfigError::PolicyInvariant(format!(
            "{}.{} must be at least 1",
            level.key(),
            field
        ))),
        _ => Ok(()),
    }
}

#[derive(Clone, Copy)]
enum Direction {
    NonDecreasing,
    NonIncreasing,
}

fn check_order<T: PartialOrd + std::fmt::Display + Copy>(
    lower: MaturityLevel,
    higher: MaturityLevel,
    field: &str,
    a: Option<T>,
    b: Option<T>,
    direction: Direction,
) -> ConfigResult<()> {
    let (Some(a), Some(b)) = (a, b) else {
        return Ok(());
    };
    let ok = match direction {
        Direction::NonDecreasing => b >= a,
        Direction::NonIncreasing => b <= a,
    };
    if ok {
        return Ok(());
    }
    let relation = match direction {
        Direction::NonDecreasing => "at least",
        Direction::NonIncreasing => "at most",
    };
    Err(ConfigError::PolicyInvariant(format!(
        "{field} for {} ({b}) must be {relation} {field} for {} ({a})",
        higher.key(),
        lower.key(),
    )))
}
