//! Maturity classification
//!
//! Maps a [`SignalSet`] to one of four ordered maturity levels. The level is
//! always returned to the caller and passed on explicitly; nothing here keeps
//! a "current level" around between calls.

mod rules;

pub use rules::{EvidenceRule, LevelRequirement, Predicate, RuleTable, RULESET_VERSION};

use crate::error::ConfigError;
use crate::signals::SignalSet;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Project maturity, totally ordered from proof-of-concept to production.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum MaturityLevel {
    #[default]
    Poc = 1,
    Development = 2,
    PreProduction = 3,
    Production = 4,
}

impl MaturityLevel {
    pub fn all() -> &'static [MaturityLevel] {
        &[
            MaturityLevel::Poc,
            MaturityLevel::Development,
            MaturityLevel::PreProduction,
            MaturityLevel::Production,
        ]
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Key used in policy documents.
    pub fn key(&self) -> &'static str {
        match self {
            MaturityLevel::Poc => "poc",
            MaturityLevel::Development => "development",
            MaturityLevel::PreProduction => "pre_production",
            MaturityLevel::Production => "production",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MaturityLevel::Poc => "PoC",
            MaturityLevel::Development => "Development",
            MaturityLevel::PreProduction => "Pre-Production",
            MaturityLevel::Production => "Production",
        }
    }
}

impl std::fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for MaturityLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "1" | "poc" => Ok(MaturityLevel::Poc),
            "2" | "development" | "dev" => Ok(MaturityLevel::Development),
            "3" | "pre_production" | "preproduction" | "preprod" => {
                Ok(MaturityLevel::PreProduction)
            }
            "4" | "production" | "prod" => Ok(MaturityLevel::Production),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown maturity level '{}'. Valid levels: poc, development, pre_production, production (or 1-4)",
                other
            ))),
        }
    }
}

/// Points earned toward one level.
#[derive(Debug, Clone, Serialize)]
pub struct LevelEvidence {
    pub level: MaturityLevel,
    pub points: u32,
    pub required: u32,
    pub met: bool,
    pub fired: Vec<&'static str>,
}

/// Classification with its evidence breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub level: MaturityLevel,
    pub ruleset_version: u32,
    pub evidence: Vec<LevelEvidence>,
}

/// Classify using the standard rule table.
pub fn classify(signals: &SignalSet) -> MaturityLevel {
    classify_with(&RuleTable::standard(), signals)
}

/// Classify against a specific rule table.
///
/// Levels are checked highest first; the first one whose minimum is met wins.
/// No level met means PoC.
pub fn classify_with(table: &RuleTable, signals: &SignalSet) -> MaturityLevel {
    let mut candidates: Vec<&LevelRequirement> = table.requirements.iter().collect();
    candidates.sort_by(|a, b| b.level.cmp(&a.level));

    candidates
        .into_iter()
        .find(|req| table.points(signals, req.level) >= req.min_points)
        .map(|req| req.level)
        .unwrap_or(MaturityLevel::Poc)
}

/// Classify and report which rules fired for every level.
pub fn explain(signals: &SignalSet) -> Classification {
    let table = RuleTable::standard();
    let level = classify_with(&table, signals);

    let evidence = MaturityLevel::all()
        .iter()
        .rev()
        .filter_map(|&lvl| {
            let required = table.requirement(lvl)?;
            let fired: Vec<&'static str> = table
                .rules_for(lvl)
                .filter(|r| r.fires(signals))
                .map(|r| r.id)
                .collect();
            let points = fired.len() as u32;
            Some(LevelEvidence {
                level: lvl,
                points,
                required,
                met: points >= required,
                fired,
            })
        })
        .collect();

    debug!("Classified signals as {} (ruleset v{})", level, table.version);

    Classification {
        level,
        ruleset_version: table.version,
        evidence,
    }
}

/// How a project's level moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Initial,
    Upgrade,
    Unchanged,
    /// Classified lower than the current level; current level kept.
    Held,
    /// Classified lower and the caller explicitly allowed the downgrade.
    Downgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelTransition {
    pub from: Option<MaturityLevel>,
    pub classified: MaturityLevel,
    pub to: MaturityLevel,
    pub kind: TransitionKind,
}

/// Apply a fresh classification to a project's current level.
///
/// Levels only move up unless `allow_downgrade` is set.
pub fn transition(
    current: Option<MaturityLevel>,
    classified: MaturityLevel,
    allow_downgrade: bool,
) -> LevelTransition {
    let (to, kind) = match current {
        None => (classified, TransitionKind::Initial),
        Some(cur) if classified > cur => (classified, TransitionKind::Upgrade),
        Some(cur) if classified == cur => (cur, TransitionKind::Unchanged),
        Some(_) if allow_downgrade => (classified, TransitionKind::Downgrade),
        Some(cur) => {
            warn!(
                "Signals classify as {} but project is at {}; keeping {} (pass --allow-downgrade to override)",
                classified, cur, cur
            );
            (cur, TransitionKind::Held)
        }
    };

    LevelTransition {
        from: current,
        classified,
        to,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(team: u32, users: u64, live: bool) -> SignalSet {
        SignalSet {
            team_size: team,
            active_users: users,
            is_in_production: live,
            ..Default::default()
        }
    }

    #[test]
    fn test_solo_prototype_is_poc() {
        assert_eq!(classify(&signals(1, 0, false)), MaturityLevel::Poc);
    }

    #[test]
    fn test_three_development_points() {
        let s = signals(4, 50, false);
        assert_eq!(classify(&s), MaturityLevel::Development);
        let explained = explain(&s);
        let dev = explained
            .evidence
            .iter()
            .find(|e| e.level == MaturityLevel::Development)
            .unwrap();
        assert_eq!(dev.points, 3);
        assert!(dev.met);
    }

    #[test]
    fn test_two_points_is_not_enough() {
        // team >= 3 and users >= 10 only
        assert_eq!(classify(&signals(3, 20, false)), MaturityLevel::Poc);
    }

    #[test]
    fn test_pre_production() {
        let s = SignalSet {
            deployment_env_count: 3,
            ..signals(5, 150, true)
        };
        assert_eq!(classify(&s), MaturityLevel::PreProduction);
    }

    #[test]
    fn test_production_needs_four_points() {
        let mut s = SignalSet {
            requires_compliance_audit: true,
            distributed_trace_needed: true,
            ..signals(2, 10, true)
        };
        // compliance + tracing + live = 3
        assert_ne!(classify(&s), MaturityLevel::Production);
        s.requests_per_second = 250.0;
        assert_eq!(classify(&s), MaturityLevel::Production);
    }

    #[test]
    fn test_higher_level_can_skip_lower() {
        let s = SignalSet {
            requires_compliance_audit: true,
            distributed_trace_needed: true,
            is_in_production: true,
            team_size: 12,
            ..Default::default()
        };
        assert_eq!(classify(&s), MaturityLevel::Production);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let s = SignalSet {
            requests_per_second: 42.0,
            deployment_env_count: 2,
            ..signals(6, 500, true)
        };
        let first = classify(&s);
        for _ in 0..10 {
            assert_eq!(classify(&s), first);
        }
    }

    #[test]
    fn test_adding_evidence_never_lowers_level() {
        let bases = [
            signals(1, 0, false),
            signals(3, 10, false),
            signals(4, 50, false),
            signals(5, 100, true),
        ];
        let bumps: [fn(&mut SignalSet); 7] = [
            |s: &mut SignalSet| s.team_size += 5,
            |s: &mut SignalSet| s.active_users = s.active_users * 20 + 10,
            |s: &mut SignalSet| s.is_in_production = true,
            |s: &mut SignalSet| s.requires_compliance_audit = true,
            |s: &mut SignalSet| s.distributed_trace_needed = true,
            |s: &mut SignalSet| s.requests_per_second += 150.0,
            |s: &mut SignalSet| s.deployment_env_count += 2,
        ];
        for base in bases {
            let before = classify(&base);
            let mut current = base;
            for bump in &bumps {
                bump(&mut current);
                let after = classify(&current);
                assert!(after >= before, "{:?} dropped to {}", current, after);
            }
        }
    }

    #[test]
    fn test_level_ordering_and_parsing() {
        assert!(MaturityLevel::Poc < MaturityLevel::Development);
        assert!(MaturityLevel::PreProduction < MaturityLevel::Production);
        assert_eq!(MaturityLevel::Production.number(), 4);
        assert_eq!(
            "pre-production".parse::<MaturityLevel>().unwrap(),
            MaturityLevel::PreProduction
        );
        assert_eq!("2".parse::<MaturityLevel>().unwrap(), MaturityLevel::Development);
        assert!("staging".parse::<MaturityLevel>().is_err());
    }

    #[test]
    fn test_transition_never_silently_downgrades() {
        let t = transition(
            Some(MaturityLevel::PreProduction),
            MaturityLevel::Development,
            false,
        );
        assert_eq!(t.to, MaturityLevel::PreProduction);
        assert_eq!(t.kind, TransitionKind::Held);

        let t = transition(
            Some(MaturityLevel::PreProduction),
            MaturityLevel::Development,
            true,
        );
        assert_eq!(t.to, MaturityLevel::Development);
        assert_eq!(t.kind, TransitionKind::Downgrade);

        let t = transition(Some(MaturityLevel::Poc), MaturityLevel::Development, false);
        assert_eq!(t.kind, TransitionKind::Upgrade);

        let t = transition(None, MaturityLevel::Development, false);
        assert_eq!(t.kind, TransitionKind::Initial);
    }
}
