//! Cyclomatic complexity per function.

use super::{analyze_sources, Cancelled, CancellationToken, Collector, CollectorOutput};
use super::{CollectorSummary, MetricDistribution};
use crate::models::{Metric, MetricKind};
use crate::tree::SourceTree;

pub struct ComplexityCollector;

impl Collector for ComplexityCollector {
    fn name(&self) -> &'static str {
        "complexity"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Complexity
    }

    fn collect(
        &self,
        tree: &dyn SourceTree,
        cancel: &CancellationToken,
    ) -> Result<CollectorOutput, Cancelled> {
        let (files, warnings) = analyze_sources(tree, cancel)?;

        let metrics: Vec<Metric> = files
            .iter()
            .flat_map(|f| {
                f.analysis.functions.iter().map(move |func| {
                    Metric::function(
                        MetricKind::Complexity,
                        func.complexity as f64,
                        &f.path,
                        &func.name,
                        func.line,
                    )
                })
            })
            .collect();

        let mut values: Vec<f64> = metrics.iter().map(|m| m.value).collect();
        let summary = CollectorSummary {
            files_scanned: files.len(),
            files_skipped: warnings.len(),
            distribution: MetricDistribution::from_values(&mut values),
            ..Default::default()
        };

        Ok(CollectorOutput {
            metrics,
            warnings,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricScope;
    use crate::tree::MemoryTree;

    #[test]
    fn test_one_metric_per_function() {
        let tree = MemoryTree::new()
            .with_file(
                "svc/handlers.py",
                r#"
def simple():
    return 1

def branchy(a, b):
    if a:
        return 1
    for x in b:
        if x and a:
            return x
    return 0
"#,
            )
            .with_file(
                "web/app.ts",
                "export function check(a: number): boolean {\n  return a > 0 || a < -10;\n}\n",
            );

        let out = ComplexityCollector
            .collect(&tree, &CancellationToken::new())
            .unwrap();
        assert_eq!(out.metrics.len(), 3);

        let branchy = out
            .metrics
            .iter()
            .find(|m| matches!(&m.scope, MetricScope::Function { name, .. } if name == "branchy"))
            .unwrap();
        assert_eq!(branchy.value, 5.0);

        let dist = out.summary.distribution.unwrap();
        assert_eq!(dist.count, 3);
        assert_eq!(dist.max, 5.0);
    }

    #[test]
    fn test_no_functions_no_metrics() {
        let tree = MemoryTree::new().with_file("config.py", "DEBUG = True\n");
        let out = ComplexityCollector
            .collect(&tree, &CancellationToken::new())
            .unwrap();
        assert!(out.metrics.is_empty());
        assert!(out.summary.distribution.is_none());
    }
}
