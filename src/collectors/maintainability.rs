//! Maintainability index per file.
//!
//! Uses the radon variant of the SEI formula, rescaled to 0..=100:
//!
//! ```text
//! MI = max(0, (171 - 5.2 ln V - 0.23 G - 16.2 ln L + 50 sin(sqrt(2.46 rad(C)))) * 100 / 171)
//! ```
//!
//! V is the Halstead volume, G the summed cyclomatic complexity, L the source
//! lines and C the comment percentage.

use super::{analyze_sources, Cancelled, CancellationToken, Collector, CollectorOutput};
use super::{CollectorSummary, MetricDistribution};
use crate::models::{Metric, MetricKind};
use crate::tree::SourceTree;
use std::collections::BTreeMap;

pub struct MaintainabilityCollector;

pub fn maintainability_index(volume: f64, complexity: u32, sloc: usize, comment_pct: f64) -> f64 {
    if volume <= 0.0 || sloc == 0 {
        return 100.0;
    }
    let comments = 50.0 * (2.46 * comment_pct.to_radians()).sqrt().sin();
    let raw = 171.0 - 5.2 * volume.ln() - 0.23 * complexity as f64 - 16.2 * (sloc as f64).ln()
        + comments;
    (raw * 100.0 / 171.0).clamp(0.0, 100.0)
}

/// Letter grade: A >= 20, B >= 10, C below.
pub fn grade(mi: f64) -> char {
    if mi >= 20.0 {
        'A'
    } else if mi >= 10.0 {
        'B'
    } else {
        'C'
    }
}

impl Collector for MaintainabilityCollector {
    fn name(&self) -> &'static str {
        "maintainability"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Maintainability
    }

    fn collect(
        &self,
        tree: &dyn SourceTree,
        cancel: &CancellationToken,
    ) -> Result<CollectorOutput, Cancelled> {
        let (files, warnings) = analyze_sources(tree, cancel)?;

        let mut facts = BTreeMap::new();
        let metrics: Vec<Metric> = files
            .iter()
            .map(|f| {
                let a = &f.analysis;
                let mi = maintainability_index(
                    a.halstead.volume(),
                    a.total_complexity(),
                    a.code_lines,
                    a.comment_percent(),
                );
                let key = match grade(mi) {
                    'A' => "grade_a",
                    'B' => "grade_b",
                    _ => "grade_c",
                };
                *facts.entry(key).or_insert(0.0) += 1.0;
                Metric::file(MetricKind::Maintainability, mi, &f.path)
            })
            .collect();

        let mut values: Vec<f64> = metrics.iter().map(|m| m.value).collect();
        let summary = CollectorSummary {
            files_scanned: files.len(),
            files_skipped: warnings.len(),
            distribution: MetricDistribution::from_values(&mut values),
            facts,
            ..Default::default()
        };

        Ok(CollectorOutput {
            metrics,
            warnings,
            summary,
        })
    }
}
