//! Source lines per file, excluding blank and comment-only lines.

use super::{analyze_sources, Cancelled, CancellationToken, Collector, CollectorOutput};
use super::{CollectorSummary, MetricDistribution};
use crate::models::{Metric, MetricKind};
use crate::tree::SourceTree;
use std::collections::BTreeMap;

pub struct FileSizeCollector;

impl Collector for FileSizeCollector {
    fn name(&self) -> &'static str {
        "file_size"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::FileLines
    }

    fn collect(
        &self,
        tree: &dyn SourceTree,
        cancel: &CancellationToken,
    ) -> Result<CollectorOutput, Cancelled> {
        let (files, warnings) = analyze_sources(tree, cancel)?;

        let metrics: Vec<Metric> = files
            .iter()
            .map(|f| Metric::file(MetricKind::FileLines, f.analysis.code_lines as f64, &f.path))
            .collect();

        let mut facts = BTreeMap::new();
        facts.insert(
            "total_lines",
            files.iter().map(|f| f.analysis.total_lines).sum::<usize>() as f64,
        );
        facts.insert(
            "code_lines",
            files.iter().map(|f| f.analysis.code_lines).sum::<usize>() as f64,
        );
        facts.insert(
            "comment_lines",
            files.iter().map(|f| f.analysis.comment_lines).sum::<usize>() as f64,
        );

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
