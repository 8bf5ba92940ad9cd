//! Quality gate evaluation
//!
//! Compares collected metrics against the policy thresholds for one maturity
//! level. Pure: the same metrics, policy and level always give the same
//! results, in the same order.

use crate::maturity::MaturityLevel;
use crate::models::{GateResult, GateStatus, Metric, MetricKind, MetricScope, Offender, RemediationHint};
use crate::policy::ThresholdPolicy;
use std::cmp::Ordering;
use tracing::debug;

/// Maximum offenders listed per failing gate.
pub const MAX_OFFENDERS: usize = 10;

pub const NOTE_NO_THRESHOLD: &str = "no threshold configured";
pub const NOTE_NO_OBSERVATIONS: &str = "no observations";

/// Evaluate every gate for `level`.
///
/// Returns one result per [`MetricKind`], in [`MetricKind::all`] order.
pub fn evaluate(
    metrics: &[Metric],
    policy: &ThresholdPolicy,
    level: MaturityLevel,
) -> Vec<GateResult> {
    let thresholds = policy.for_level(level);
    if thresholds.is_none() {
        debug!("Policy defines no thresholds for {}", level);
    }

    MetricKind::all()
        .iter()
        .map(|&kind| {
            let threshold = thresholds.and_then(|t| t.threshold(kind));
            evaluate_kind(kind, metrics, threshold)
        })
        .collect()
}

fn evaluate_kind(kind: MetricKind, metrics: &[Metric], threshold: Option<f64>) -> GateResult {
    let observations: Vec<&Metric> = metrics
        .iter()
        .filter(|m| m.kind == kind && gated_scope(kind, &m.scope))
        .collect();
    let observed = aggregate(kind, &observations);

    let Some(threshold) = threshold else {
        return not_evaluated(kind, observed, None, NOTE_NO_THRESHOLD);
    };

    let observed = match observed {
        Some(v) => v,
        // no files at all: nothing duplicated, no oversized files, no deps
        None if empty_means_zero(kind) => 0.0,
        // no functions or files to score: nothing can exceed the limit
        None => return vacuous_pass(kind, threshold),
    };

    let passed = within(kind, observed, threshold);
    let offenders = if passed {
        Vec::new()
    } else {
        offenders(kind, metrics, threshold)
    };

    debug!(
        "gate {}: observed {:.2} vs {:.2} -> {}",
        kind,
        observed,
        threshold,
        if passed { "pass" } else { "fail" }
    );

    GateResult {
        metric: kind,
        status: if passed {
            GateStatus::Passed
        } else {
            GateStatus::Failed
        },
        passed,
        observed: Some(observed),
        threshold: Some(threshold),
        remediation: if passed {
            RemediationHint::None
        } else {
            RemediationHint::for_kind(kind)
        },
        offenders,
        note: None,
    }
}

fn vacuous_pass(kind: MetricKind, threshold: f64) -> GateResult {
    debug!("gate {}: no observations, passing against {:.2}", kind, threshold);
    GateResult {
        metric: kind,
        status: GateStatus::Passed,
        passed: true,
        observed: None,
        threshold: Some(threshold),
        remediation: RemediationHint::None,
        offenders: Vec::new(),
        note: Some(NOTE_NO_OBSERVATIONS.to_string()),
    }
}

fn not_evaluated(
    kind: MetricKind,
    observed: Option<f64>,
    threshold: Option<f64>,
    note: &str,
) -> GateResult {
    GateResult {
        metric: kind,
        status: GateStatus::NotEvaluated,
        passed: false,
        observed,
        threshold,
        remediation: RemediationHint::None,
        offenders: Vec::new(),
        note: Some(note.to_string()),
    }
}

/// Duplication is gated on the project ratio; per-file ratios only name offenders.
fn gated_scope(kind: MetricKind, scope: &MetricScope) -> bool {
    match kind {
        MetricKind::Duplication => *scope == MetricScope::Project,
        _ => true,
    }
}

fn empty_means_zero(kind: MetricKind) -> bool {
    matches!(
        kind,
        MetricKind::Duplication | MetricKind::FileLines | MetricKind::Dependencies
    )
}

fn aggregate(kind: MetricKind, observations: &[&Metric]) -> Option<f64> {
    if observations.is_empty() {
        return None;
    }
    let values = observations.iter().map(|m| m.value);
    let value = match kind {
        MetricKind::Duplication | MetricKind::Complexity | MetricKind::FileLines => {
            values.fold(f64::MIN, f64::max)
        }
        MetricKind::Maintainability => values.fold(f64::MAX, f64::min),
        MetricKind::Dependencies => values.sum(),
    };
    Some(value)
}

fn within(kind: MetricKind, observed: f64, threshold: f64) -> bool {
    if kind.higher_is_better() {
        observed >= threshold
    } else {
        observed <= threshold
    }
}

/// Scopes responsible for a failure, worst first.
fn offenders(kind: MetricKind, metrics: &[Metric], threshold: f64) -> Vec<Offender> {
    let mut candidates: Vec<&Metric> = metrics
        .iter()
        .filter(|m| m.kind == kind && m.scope != MetricScope::Project)
        .filter(|m| match kind {
            // every manifest contributes to the sum
            MetricKind::Dependencies => m.value > 0.0,
            MetricKind::Duplication => true,
            _ => !within(kind, m.value, threshold),
        })
        .collect();

    candidates.sort_by(|a, b| {
        let by_value = if kind.higher_is_better() {
            a.value.partial_cmp(&b.value)
        } else {
            b.value.partial_cmp(&a.value)
        };
        by_value
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.scope.cmp(&b.scope))
    });

    candidates
        .into_iter()
        .take(MAX_OFFENDERS)
        .map(|m| Offender {
            scope: m.scope.clone(),
            value: m.value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::LevelThresholds;
    use std::collections::BTreeMap;

    fn policy_with(level: MaturityLevel, t: LevelThresholds) -> ThresholdPolicy {
        let mut levels = BTreeMap::new();
        levels.insert(level, t);
        ThresholdPolicy { version: 1, levels }
    }

    fn result(results: &[GateResult], kind: MetricKind) -> &GateResult {
        results.iter().find(|r| r.metric == kind).unwrap()
    }

    #[test]
    fn test_duplication_over_threshold_fails() {
        let metrics = vec![
            Metric::project(MetricKind::Duplication, 12.0),
            Metric::file(MetricKind::Duplication, 40.0, "a.py"),
            Metric::file(MetricKind::Duplication, 55.0, "b.py"),
        ];
        let policy = policy_with(
            MaturityLevel::Development,
            LevelThresholds {
                duplication_max_pct: Some(10.0),
                ..Default::default()
            },
        );
        let results = evaluate(&metrics, &policy, MaturityLevel::Development);
        let dup = result(&results, MetricKind::Duplication);
        assert_eq!(dup.status, GateStatus::Failed);
        assert!(!dup.passed);
        assert_eq!(dup.observed, Some(12.0));
        assert_eq!(dup.threshold, Some(10.0));
        assert_eq!(dup.remediation, RemediationHint::ExtractSharedCode);
        assert_eq!(
            dup.offenders[0].scope,
            MetricScope::File { path: "b.py".into() }
        );
    }

    #[test]
    fn test_results_in_fixed_order() {
        let results = evaluate(&[], &ThresholdPolicy::builtin(), MaturityLevel::Poc);
        let kinds: Vec<_> = results.iter().map(|r| r.metric).collect();
        assert_eq!(kinds, MetricKind::all());
    }

    #[test]
    fn test_missing_threshold_is_not_evaluated() {
        let policy = policy_with(
            MaturityLevel::Production,
            LevelThresholds {
                complexity_max: Some(10),
                ..Default::default()
            },
        );
        let metrics = vec![Metric::project(MetricKind::Duplication, 50.0)];
        let results = evaluate(&metrics, &policy, MaturityLevel::Production);
        let dup = result(&results, MetricKind::Duplication);
        assert_eq!(dup.status, GateStatus::NotEvaluated);
        assert_eq!(dup.note.as_deref(), Some(NOTE_NO_THRESHOLD));
        assert_eq!(dup.observed, Some(50.0));
        assert!(!dup.passed);

        // level missing from the policy entirely
        let results = evaluate(&metrics, &policy, MaturityLevel::Poc);
        assert!(results.iter().all(|r| r.status == GateStatus::NotEvaluated));
    }

    #[test]
    fn test_empty_observations() {
        let results = evaluate(&[], &ThresholdPolicy::builtin(), MaturityLevel::Development);
        for kind in [MetricKind::Duplication, MetricKind::FileLines, MetricKind::Dependencies] {
            let r = result(&results, kind);
            assert_eq!(r.status, GateStatus::Passed, "{}", kind);
            assert_eq!(r.observed, Some(0.0));
        }
        for kind in [MetricKind::Complexity, MetricKind::Maintainability] {
            let r = result(&results, kind);
            assert_eq!(r.status, GateStatus::Passed, "{}", kind);
            assert!(r.passed);
            assert_eq!(r.observed, None);
            assert!(r.threshold.is_some());
            assert_eq!(r.note.as_deref(), Some(NOTE_NO_OBSERVATIONS));
        }
    }

    #[test]
    fn test_aggregations() {
        let metrics = vec![
            Metric::function(MetricKind::Complexity, 4.0, "a.py", "f", 1),
            Metric::function(MetricKind::Complexity, 14.0, "a.py", "g", 10),
            Metric::function(MetricKind::Complexity, 11.0, "b.py", "h", 3),
            Metric::file(MetricKind::Maintainability, 80.0, "a.py"),
            Metric::file(MetricKind::Maintainability, 15.0, "b.py"),
            Metric::file(MetricKind::FileLines, 120.0, "a.py"),
            Metric::file(MetricKind::FileLines, 390.0, "b.py"),
            Metric::file(MetricKind::Dependencies, 12.0, "requirements.txt"),
            Metric::file(MetricKind::Dependencies, 9.0, "web/package.json"),
        ];
        let results = evaluate(&metrics, &ThresholdPolicy::builtin(), MaturityLevel::Development);

        let cx = result(&results, MetricKind::Complexity);
        assert_eq!(cx.observed, Some(14.0));
        assert_eq!(cx.status, GateStatus::Failed);
        assert_eq!(cx.remediation, RemediationHint::ReduceBranching);
        let names: Vec<String> = cx.offenders.iter().map(|o| o.scope.to_string()).collect();
        assert_eq!(names, vec!["a.py:10 g", "b.py:3 h"]);

        let mi = result(&results, MetricKind::Maintainability);
        assert_eq!(mi.observed, Some(15.0));
        assert_eq!(mi.status, GateStatus::Failed);
        assert_eq!(mi.offenders.len(), 1);

        let lines = result(&results, MetricKind::FileLines);
        assert_eq!(lines.observed, Some(390.0));
        assert!(lines.passed);
        assert_eq!(lines.remediation, RemediationHint::None);

        let deps = result(&results, MetricKind::Dependencies);
        assert_eq!(deps.observed, Some(21.0));
        assert_eq!(deps.status, GateStatus::Failed);
        assert_eq!(deps.remediation, RemediationHint::PruneDependencies);
        assert_eq!(deps.offenders.len(), 2);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let metrics = vec![Metric::project(MetricKind::Duplication, 10.0)];
        let results = evaluate(&metrics, &ThresholdPolicy::builtin(), MaturityLevel::Development);
        assert!(result(&results, MetricKind::Duplication).passed);
    }

    #[test]
    fn test_offenders_capped() {
        let metrics: Vec<Metric> = (0..25)
            .map(|i| Metric::file(MetricKind::FileLines, 1000.0 + i as f64, format!("f{}.py", i)))
            .collect();
        let results = evaluate(&metrics, &ThresholdPolicy::builtin(), MaturityLevel::Production);
        let lines = result(&results, MetricKind::FileLines);
        assert_eq!(lines.offenders.len(), MAX_OFFENDERS);
        assert_eq!(lines.offenders[0].value, 1024.0);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let metrics = vec![
            Metric::project(MetricKind::Duplication, 7.5),
            Metric::function(MetricKind::Complexity, 9.0, "x.rs", "run", 2),
        ];
        let policy = ThresholdPolicy::builtin();
        let first = evaluate(&metrics, &policy, MaturityLevel::PreProduction);
        let second = evaluate(&metrics, &policy, MaturityLevel::PreProduction);
        assert_eq!(first, second);
    }
}
