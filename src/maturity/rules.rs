//! Evidence rule table
//!
//! The maturity guides describe level upgrades as narrative checklists. This
//! table is a scored reinterpretation of those checklists, not a literal
//! transcription: every rule awards one evidence point toward one level, and a
//! level is reached once its points meet the minimum. Bump `RULESET_VERSION`
//! whenever a rule or minimum changes.
//!
//! Every predicate is upward-closed (`>=` or `== true`), so adding evidence to
//! a signal set can only add points.

use super::MaturityLevel;
use crate::signals::{
    SignalSet, SignalValue, ACTIVE_USERS, DEPLOYMENT_ENV_COUNT, DISTRIBUTED_TRACE_NEEDED,
    IS_IN_PRODUCTION, REQUESTS_PER_SECOND, REQUIRES_COMPLIANCE_AUDIT, TEAM_SIZE,
};
use serde::Serialize;

pub const RULESET_VERSION: u32 = 1;

/// Condition a signal must satisfy to award its point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    AtLeast(f64),
    IsTrue,
}

impl Predicate {
    pub fn holds(&self, value: SignalValue) -> bool {
        match (self, value) {
            (Predicate::AtLeast(min), SignalValue::Count(n)) => n as f64 >= *min,
            (Predicate::AtLeast(min), SignalValue::Rate(r)) => r >= *min,
            (Predicate::IsTrue, SignalValue::Flag(b)) => b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::AtLeast(min) => write!(f, ">= {}", min),
            Predicate::IsTrue => write!(f, "== true"),
        }
    }
}

/// One evidence point toward `level`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvidenceRule {
    pub id: &'static str,
    pub level: MaturityLevel,
    pub signal: &'static str,
    pub predicate: Predicate,
}

impl EvidenceRule {
    pub fn fires(&self, signals: &SignalSet) -> bool {
        signals
            .get(self.signal)
            .map(|v| self.predicate.holds(v))
            .unwrap_or(false)
    }
}

/// Points needed to reach a level.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LevelRequirement {
    pub level: MaturityLevel,
    pub min_points: u32,
}

/// A versioned set of rules and minimums.
#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    pub version: u32,
    pub rules: &'static [EvidenceRule],
    pub requirements: &'static [LevelRequirement],
}

const fn rule(
    id: &'static str,
    level: MaturityLevel,
    signal: &'static str,
    predicate: Predicate,
) -> EvidenceRule {
    EvidenceRule {
        id,
        level,
        signal,
        predicate,
    }
}

use self::Predicate::{AtLeast, IsTrue};
use super::MaturityLevel::{Development, PreProduction, Production};

static STANDARD_RULES: &[EvidenceRule] = &[
    // Development: more than a solo prototype, real people trying it.
    rule("dev.team", Development, TEAM_SIZE, AtLeast(3.0)),
    rule("dev.testers", Development, ACTIVE_USERS, AtLeast(10.0)),
    rule("dev.beta_cohort", Development, ACTIVE_USERS, AtLeast(50.0)),
    rule("dev.environments", Development, DEPLOYMENT_ENV_COUNT, AtLeast(2.0)),
    rule("dev.traffic", Development, REQUESTS_PER_SECOND, AtLeast(1.0)),
    // Pre-production: live or about to be, with a staging path.
    rule("preprod.live", PreProduction, IS_IN_PRODUCTION, IsTrue),
    rule("preprod.users", PreProduction, ACTIVE_USERS, AtLeast(100.0)),
    rule("preprod.team", PreProduction, TEAM_SIZE, AtLeast(5.0)),
    rule("preprod.environments", PreProduction, DEPLOYMENT_ENV_COUNT, AtLeast(3.0)),
    rule("preprod.traffic", PreProduction, REQUESTS_PER_SECOND, AtLeast(10.0)),
    // Production: audited, traced, sustained load.
    rule("prod.compliance", Production, REQUIRES_COMPLIANCE_AUDIT, IsTrue),
    rule("prod.tracing", Production, DISTRIBUTED_TRACE_NEEDED, IsTrue),
    rule("prod.live", Production, IS_IN_PRODUCTION, IsTrue),
    rule("prod.users", Production, ACTIVE_USERS, AtLeast(1000.0)),
    rule("prod.traffic", Production, REQUESTS_PER_SECOND, AtLeast(100.0)),
    rule("prod.team", Production, TEAM_SIZE, AtLeast(10.0)),
];

static STANDARD_REQUIREMENTS: &[LevelRequirement] = &[
    LevelRequirement {
        level: Production,
        min_points: 4,
    },
    LevelRequirement {
        level: PreProduction,
        min_points: 3,
    },
    LevelRequirement {
        level: Development,
        min_points: 3,
    },
];

impl RuleTable {
    pub const fn standard() -> Self {
        Self {
            version: RULESET_VERSION,
            rules: STANDARD_RULES,
            requirements: STANDARD_REQUIREMENTS,
        }
    }

    /// Rules contributing to `level`.
    pub fn rules_for(&self, level: MaturityLevel) -> impl Iterator<Item = &EvidenceRule> {
        self.rules.iter().filter(move |r| r.level == level)
    }

    /// Points a signal set earns toward `level`.
    pub fn points(&self, signals: &SignalSet, level: MaturityLevel) -> u32 {
        self.rules_for(level).filter(|r| r.fires(signals)).count() as u32
    }

    pub fn requirement(&self, level: MaturityLevel) -> Option<u32> {
        self.requirements
            .iter()
            .find(|r| r.level == level)
            .map(|r| r.min_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_rule_names_a_known_signal() {
        let signals = SignalSet::default();
        for rule in RuleTable::standard().rules {
            assert!(
                signals.get(rule.signal).is_some(),
                "rule {} references unknown signal {}",
                rule.id,
                rule.signal
            );
        }
    }

    #[test]
    fn test_requirements_are_reachable() {
        let table = RuleTable::standard();
        for req in table.requirements {
            let available = table.rules_for(req.level).count() as u32;
            assert!(req.min_points >= 1);
            assert!(
                available >= req.min_points,
                "{} needs {} points but only {} rules exist",
                req.level,
                req.min_points,
                available
            );
        }
        assert!(table.requirement(MaturityLevel::Poc).is_none());
    }

    #[test]
    fn test_rule_ids_unique() {
        let mut ids: Vec<_> = RuleTable::standard().rules.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len());
    }

    #[test]
    fn test_predicate_type_mismatch_never_fires() {
        assert!(!Predicate::IsTrue.holds(SignalValue::Count(5)));
        assert!(!Predicate::AtLeast(1.0).holds(SignalValue::Flag(true)));
        assert!(Predicate::AtLeast(3.0).holds(SignalValue::Count(3)));
        assert!(Predicate::AtLeast(9.5).holds(SignalValue::Rate(9.5)));
    }
}
