//! Verdict aggregation and report assembly
//!
//! Nothing here evaluates anything: the verdict combines naming outcomes and
//! gate results, and the report attaches the evidence gathered on the way.

use crate::collectors::{self, CancellationToken, Collection, CollectorSummary};
use crate::config::ProjectConfig;
use crate::error::{CollectorWarning, RunError};
use crate::gate;
use crate::maturity::{self, Classification, LevelTransition, MaturityLevel};
use crate::models::{GateResult, GateStatus};
use crate::naming::{NameRequest, Namespace, NamingError, NamingWarning, Resolution};
use crate::policy::ThresholdPolicy;
use crate::signals::SignalSet;
use crate::tree::{DirectoryTree, SourceTree};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Final pass/fail decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub maturity_level: MaturityLevel,
    pub naming_errors: Vec<NamingError>,
    pub gate_results: Vec<GateResult>,
    /// No naming errors and every evaluated gate passed.
    pub overall_pass: bool,
}

impl Verdict {
    /// Verdict for a single naming request.
    pub fn build(
        level: MaturityLevel,
        naming: &Result<Resolution, NamingError>,
        gate_results: Vec<GateResult>,
    ) -> Self {
        Self::build_all(level, std::slice::from_ref(naming), gate_results)
    }

    /// Verdict for any number of naming requests (including none).
    pub fn build_all(
        level: MaturityLevel,
        naming: &[Result<Resolution, NamingError>],
        gate_results: Vec<GateResult>,
    ) -> Self {
        let naming_errors: Vec<NamingError> = naming
            .iter()
            .filter_map(|r| r.as_ref().err().cloned())
            .collect();

        let overall_pass = naming_errors.is_empty() && gate_results.iter().all(|g| g.passed);

        Self {
            maturity_level: level,
            naming_errors,
            gate_results,
            overall_pass,
        }
    }

    pub fn gate_counts(&self) -> GateCounts {
        let mut counts = GateCounts::default();
        for g in &self.gate_results {
            match g.status {
                GateStatus::Passed => counts.passed += 1,
                GateStatus::Failed => counts.failed += 1,
                GateStatus::NotEvaluated => counts.not_evaluated += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateCounts {
    pub passed: usize,
    pub failed: usize,
    pub not_evaluated: usize,
}

/// A resolved service name and the warnings raised for it.
#[derive(Debug, Clone, Serialize)]
pub struct NamedService {
    pub name: String,
    pub segments: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NamingWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub gates: GateCounts,
    pub naming_errors: usize,
    pub collector_warnings: usize,
    pub headline: String,
}

/// Everything a `check` run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub tool_version: &'static str,
    pub verdict: Verdict,
    pub classification: Classification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<LevelTransition>,
    pub policy_source: String,
    pub services: Vec<NamedService>,
    pub collectors: Vec<CollectorSummary>,
    pub collector_warnings: Vec<CollectorWarning>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn build(
        verdict: Verdict,
        classification: Classification,
        naming: &[Result<Resolution, NamingError>],
        collection: Collection,
        policy_source: impl Into<String>,
    ) -> Self {
        let services: Vec<NamedService> = naming
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|res| NamedService {
                name: res.full_name.clone(),
                segments: res.name.segment_count(),
                warnings: res.warnings.clone(),
            })
            .collect();

        let gates = verdict.gate_counts();
        let headline = headline(&verdict, gates);

        let summary = ReportSummary {
            gates,
            naming_errors: verdict.naming_errors.len(),
            collector_warnings: collection.warnings.len(),
            headline,
        };

        Self {
            tool_version: env!("CARGO_PKG_VERSION"),
            verdict,
            classification,
            transition: None,
            policy_source: policy_source.into(),
            services,
            collectors: collection.summaries,
            collector_warnings: collection.warnings,
            summary,
        }
    }

    pub fn with_transition(mut self, transition: LevelTransition) -> Self {
        self.transition = Some(transition);
        self
    }
}

/// Inputs for a full evaluation of one generated project.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub signals: SignalSet,
    pub policy: ThresholdPolicy,
    /// Where the policy came from, for the report.
    pub policy_source: String,
    pub services: Vec<NameRequest>,
    pub existing: Namespace,
    /// Level the project currently holds, if any.
    pub current_level: Option<MaturityLevel>,
    pub allow_downgrade: bool,
    pub config: ProjectConfig,
}

/// Classify, resolve names, collect metrics under `source_dir` and gate them.
pub fn run_check(
    request: &CheckRequest,
    source_dir: &Path,
    cancel: &CancellationToken,
) -> Result<Report, RunError> {
    let tree = DirectoryTree::open(source_dir, &request.config.collectors.exclude)?;
    run_check_on(request, &tree, cancel)
}

/// [`run_check`] over an already opened tree.
pub fn run_check_on(
    request: &CheckRequest,
    tree: &dyn SourceTree,
    cancel: &CancellationToken,
) -> Result<Report, RunError> {
    let classification = maturity::explain(&request.signals);
    let transition = maturity::transition(
        request.current_level,
        classification.level,
        request.allow_downgrade,
    );
    let level = transition.to;

    let naming = request
        .config
        .naming_rules()
        .resolve_all(&request.services, &request.existing);

    let standard = collectors::standard_collectors(&request.config.collectors);
    let collection =
        collectors::run_collectors(&standard, tree, cancel).map_err(|_| RunError::Cancelled)?;

    let gate_results = gate::evaluate(&collection.metrics, &request.policy, level);
    let verdict = Verdict::build_all(level, &naming, gate_results);
    info!(
        "Verdict at {}: {}",
        level,
        if verdict.overall_pass { "pass" } else { "fail" }
    );

    let mut report = Report::build(
        verdict,
        classification,
        &naming,
        collection,
        request.policy_source.clone(),
    );
    if request.current_level.is_some() {
        report = report.with_transition(transition);
    }
    Ok(report)
}

fn headline(verdict: &Verdict, gates: GateCounts) -> String {
    let outcome = if verdict.overall_pass { "PASS" } else { "FAIL" };
    let mut parts = vec![format!(
        "{} of {} gates passed",
        gates.passed,
        verdict.gate_results.len()
    )];
    if gates.failed > 0 {
        parts.push(format!("{} failed", gates.failed));
    }
    if gates.not_evaluated > 0 {
        parts.push(format!("{} not evaluated", gates.not_evaluated));
    }
    if !verdict.naming_errors.is_empty() {
        parts.push(format!("{} naming error(s)", verdict.naming_errors.len()));
    }
    format!(
        "{} at {}: {}",
        outcome,
        verdict.maturity_level.label(),
        parts.join(", ")
    )
}
