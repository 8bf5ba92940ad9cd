//! Text (terminal) reporter with colors and formatting

use super::{ClassifyOutcome, NameOutcome};
use crate::maturity::TransitionKind;
use crate::models::{GateResult, GateStatus, MetricKind};
use crate::naming::NamingError;
use crate::verdict::Report;
use anyhow::Result;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Collector warnings shown before truncating.
const MAX_WARNINGS_SHOWN: usize = 10;

/// Escape codes used by the text reporter; empty when color is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    reset: &'static str,
    bold: &'static str,
    dim: &'static str,
    green: &'static str,
    yellow: &'static str,
    red: &'static str,
}

impl Palette {
    pub fn ansi() -> Self {
        Self {
            reset: RESET,
            bold: BOLD,
            dim: DIM,
            green: GREEN,
            yellow: YELLOW,
            red: RED,
        }
    }

    pub fn plain() -> Self {
        Self {
            reset: "",
            bold: "",
            dim: "",
            green: "",
            yellow: "",
            red: "",
        }
    }

    pub fn new(color: bool) -> Self {
        if color {
            Self::ansi()
        } else {
            Self::plain()
        }
    }

    fn status(&self, status: GateStatus) -> (&'static str, &'static str) {
        match status {
            GateStatus::Passed => (self.green, "PASS"),
            GateStatus::Failed => (self.red, "FAIL"),
            GateStatus::NotEvaluated => (self.yellow, "SKIP"),
        }
    }
}

/// Render a check report as formatted terminal output
pub fn render(report: &Report, p: Palette) -> Result<String> {
    let Palette {
        reset,
        bold,
        dim,
        green,
        red,
        ..
    } = p;
    let mut out = String::new();
    let verdict = &report.verdict;

    // Header
    out.push_str(&format!("\n{bold}scaffold-gate check{reset}\n"));
    out.push_str(&format!(
        "{dim}──────────────────────────────────────{reset}\n"
    ));
    let (verdict_c, verdict_s) = if verdict.overall_pass {
        (green, "PASS")
    } else {
        (red, "FAIL")
    };
    out.push_str(&format!(
        "Verdict: {verdict_c}{bold}{verdict_s}{reset}  Level: {bold}{}{reset}  {dim}(rules v{}, policy {}){reset}\n",
        verdict.maturity_level, report.classification.ruleset_version, report.policy_source
    ));
    if let Some(t) = &report.transition {
        if t.kind == TransitionKind::Held {
            out.push_str(&format!(
                "  {dim}signals classify as {} but the project stays at {}{reset}\n",
                t.classified, t.to
            ));
        }
    }
    out.push('\n');

    // Gates
    out.push_str(&format!("{bold}GATES{reset}\n"));
    for gate in &verdict.gate_results {
        out.push_str(&gate_line(gate, p));
        for offender in &gate.offenders {
            out.push_str(&format!(
                "         {dim}{:<48} {}{reset}\n",
                offender.scope.to_string(),
                format_value(gate.metric, offender.value)
            ));
        }
    }
    out.push('\n');

    // Services
    if !report.services.is_empty() || !verdict.naming_errors.is_empty() {
        out.push_str(&format!("{bold}SERVICES{reset}\n"));
        for service in &report.services {
            out.push_str(&format!("  {green}✓{reset} {}\n", service.name));
            for w in &service.warnings {
                out.push_str(&format!("      {dim}{}{reset}\n", w));
            }
        }
        for err in &verdict.naming_errors {
            out.push_str(&naming_error_lines(err, p));
        }
        out.push('\n');
    }

    // Collector diagnostics
    if !report.collectors.is_empty() {
        out.push_str(&format!("{bold}COLLECTORS{reset}\n"));
        for s in &report.collectors {
            out.push_str(&format!(
                "  {:<16} {:>5} files  {dim}{} skipped, {} ms{reset}",
                s.collector, s.files_scanned, s.files_skipped, s.duration_ms
            ));
            if let Some(d) = &s.distribution {
                out.push_str(&format!(
                    "  {dim}mean {:.1}  p90 {:.1}  max {:.0}{reset}",
                    d.mean, d.p90, d.max
                ));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    // Warnings
    let warnings = &report.collector_warnings;
    if !warnings.is_empty() {
        out.push_str(&format!("{bold}WARNINGS{reset} ({} total)\n", warnings.len()));
        for w in warnings.iter().take(MAX_WARNINGS_SHOWN) {
            out.push_str(&format!("  {dim}{}{reset}\n", w));
        }
        let remaining = warnings.len().saturating_sub(MAX_WARNINGS_SHOWN);
        if remaining > 0 {
            out.push_str(&format!(
                "  {dim}...and {} more (use --format json for all){reset}\n",
                remaining
            ));
        }
        out.push('\n');
    }

    out.push_str(&format!("{}\n", report.summary.headline));
    Ok(out)
}

fn gate_line(gate: &GateResult, p: Palette) -> String {
    let Palette { reset, dim, .. } = p;
    let (color, tag) = p.status(gate.status);

    let comparison = match (gate.observed, gate.threshold) {
        (Some(observed), Some(threshold)) => {
            let bound = if gate.metric.higher_is_better() {
                "min"
            } else {
                "max"
            };
            format!(
                "{} {dim}({} {}){reset}",
                format_value(gate.metric, observed),
                bound,
                format_value(gate.metric, threshold)
            )
        }
        (Some(observed), None) => format_value(gate.metric, observed),
        (None, Some(threshold)) => format!("{dim}(limit {}){reset}", format_value(gate.metric, threshold)),
        (None, None) => String::new(),
    };

    let mut line = format!(
        "  {color}[{tag}]{reset} {:<16} {}",
        gate.metric.as_str(),
        comparison
    );
    if let Some(note) = &gate.note {
        line.push_str(&format!("  {dim}{}{reset}", note));
    }
    if gate.is_failed() {
        line.push_str(&format!("  {dim}→ {}{reset}", gate.remediation));
    }
    line.push('\n');
    line
}

fn format_value(kind: MetricKind, value: f64) -> String {
    match kind {
        MetricKind::Duplication | MetricKind::Maintainability => {
            format!("{:.1}{}", value, kind.unit().suffix())
        }
        _ => format!("{:.0}{}", value, kind.unit().suffix()),
    }
}

fn naming_error_lines(err: &NamingError, p: Palette) -> String {
    let Palette { reset, dim, red, .. } = p;
    match err {
        NamingError::InvalidSegments { violations } => {
            let mut out = format!("  {red}✗{reset} invalid name\n");
            for v in violations {
                out.push_str(&format!("      {dim}{}{reset}\n", v));
            }
            out
        }
        other => format!("  {red}✗{reset} {}\n", other),
    }
}

/// Render a classification with its evidence table
pub fn render_classification(outcome: &ClassifyOutcome<'_>, p: Palette) -> Result<String> {
    let Palette {
        reset,
        bold,
        dim,
        green,
        ..
    } = p;
    let c = outcome.classification;
    let t = outcome.transition;
    let mut out = String::new();

    out.push_str(&format!(
        "\nMaturity: {bold}{}{reset} {dim}({}, rules v{}){reset}\n",
        t.to,
        t.to.key(),
        c.ruleset_version
    ));
    match t.kind {
        TransitionKind::Held => out.push_str(&format!(
            "  {dim}signals classify as {}, kept at current level {}{reset}\n",
            t.classified, t.to
        )),
        TransitionKind::Upgrade | TransitionKind::Downgrade => {
            if let Some(from) = t.from {
                out.push_str(&format!("  {dim}{} → {}{reset}\n", from, t.to));
            }
        }
        TransitionKind::Initial | TransitionKind::Unchanged => {}
    }
    out.push('\n');

    out.push_str(&format!("{bold}EVIDENCE{reset}\n"));
    for e in &c.evidence {
        let mark = if e.met {
            format!("{green}✓{reset}")
        } else {
            " ".to_string()
        };
        out.push_str(&format!(
            "  {} {:<16} {}/{}  {dim}{}{reset}\n",
            mark,
            e.level.label(),
            e.points,
            e.required,
            e.fired.join(", ")
        ));
    }
    Ok(out)
}

/// Render a naming result
pub fn render_naming(outcome: &NameOutcome<'_>, p: Palette) -> Result<String> {
    let Palette {
        reset, dim, yellow, ..
    } = p;
    let mut out = String::new();
    match outcome {
        NameOutcome::Resolved(res) => {
            out.push_str(&format!("{}\n", res.full_name));
            for w in &res.warnings {
                out.push_str(&format!("  {yellow}warning:{reset} {dim}{}{reset}\n", w));
            }
        }
        NameOutcome::Rejected { error } => out.push_str(&naming_error_lines(error, p)),
    }
    Ok(out)
}
