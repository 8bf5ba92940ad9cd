//! Metric collectors
//!
//! Each collector walks a [`SourceTree`] and turns what it finds into
//! [`Metric`]s. Collectors are independent: they run concurrently on the
//! rayon pool and one collector's warnings never affect another's output.
//!
//! | Collector | Metric | Scope |
//! |---|---|---|
//! | `duplication` | duplicated code lines, % | project (+ files) |
//! | `complexity` | cyclomatic complexity | function |
//! | `maintainability` | maintainability index | file |
//! | `file_size` | source lines | file |
//! | `dependencies` | declared dependencies | manifest file |

mod complexity;
mod dependencies;
mod distribution;
mod duplication;
mod file_size;
mod maintainability;

pub use complexity::ComplexityCollector;
pub use dependencies::DependencyCollector;
pub use distribution::MetricDistribution;
pub use duplication::DuplicationCollector;
pub use file_size::FileSizeCollector;
pub use maintainability::{grade, maintainability_index, MaintainabilityCollector};

use crate::config::CollectorsConfig;
use crate::error::CollectorWarning;
use crate::models::{Metric, MetricKind};
use crate::syntax::SourceAnalysis;
use crate::tree::SourceTree;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Returned by a collector that saw the cancellation flag.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("collection cancelled")]
pub struct Cancelled;

/// Cooperative cancellation flag, polled between files.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-collector diagnostics that go into the report but not into gating.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectorSummary {
    pub collector: &'static str,
    pub files_scanned: usize,
    pub files_skipped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<MetricDistribution>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub facts: BTreeMap<&'static str, f64>,
    pub duration_ms: u64,
}

/// What one collector produced.
#[derive(Debug, Clone, Default)]
pub struct CollectorOutput {
    pub metrics: Vec<Metric>,
    pub warnings: Vec<CollectorWarning>,
    pub summary: CollectorSummary,
}

/// Trait for all metric collectors
pub trait Collector: Send + Sync {
    /// Stable identifier, used in warnings and summaries
    fn name(&self) -> &'static str;

    /// Metric kind this collector emits
    fn kind(&self) -> MetricKind;

    fn collect(
        &self,
        tree: &dyn SourceTree,
        cancel: &CancellationToken,
    ) -> Result<CollectorOutput, Cancelled>;
}

/// The five standard collectors.
pub fn standard_collectors(config: &CollectorsConfig) -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(DuplicationCollector::new(config.duplication_min_tokens)),
        Box::new(ComplexityCollector),
        Box::new(MaintainabilityCollector),
        Box::new(FileSizeCollector),
        Box::new(DependencyCollector),
    ]
}

/// Collector name on warnings raised while reading or parsing source files.
///
/// Every source collector shares one parse per file, so these warnings are
/// reported once rather than once per collector.
pub const SOURCE_WARNING: &str = "source";

/// Merged output of a collector run, in deterministic order.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub metrics: Vec<Metric>,
    pub warnings: Vec<CollectorWarning>,
    pub summaries: Vec<CollectorSummary>,
}

/// Run collectors concurrently and merge their output.
///
/// Metrics are sorted by `(kind, scope)` and warnings by `(collector, path)`,
/// so the result does not depend on which collector finished first. Shared
/// source warnings appear once.
pub fn run_collectors(
    collectors: &[Box<dyn Collector>],
    tree: &dyn SourceTree,
    cancel: &CancellationToken,
) -> Result<Collection, Cancelled> {
    let start = Instant::now();

    let outputs: Vec<CollectorOutput> = collectors
        .par_iter()
        .map(|c| -> Result<CollectorOutput, Cancelled> {
            let t = Instant::now();
            let mut out = c.collect(tree, cancel)?;
            out.summary.collector = c.name();
            out.summary.duration_ms = t.elapsed().as_millis() as u64;
            debug!(
                "{} collector: {} metrics, {} warnings in {}ms",
                c.name(),
                out.metrics.len(),
                out.warnings.len(),
                out.summary.duration_ms
            );
            Ok(out)
        })
        .collect::<Result<_, _>>()?;
    cancel.check()?;

    let mut collection = Collection::default();
    for out in outputs {
        collection.metrics.extend(out.metrics);
        collection.warnings.extend(out.warnings);
        collection.summaries.push(out.summary);
    }

    collection
        .metrics
        .sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.scope.cmp(&b.scope)));
    collection
        .warnings
        .sort_by(|a, b| (&a.collector, &a.path).cmp(&(&b.collector, &b.path)));
    collection.warnings.dedup();
    for w in collection.warnings.iter().filter(|w| w.collector == SOURCE_WARNING) {
        warn!("{}", w);
    }
    collection.summaries.sort_by_key(|s| s.collector);

    info!(
        "Collected {} metrics ({} warnings) in {:?}",
        collection.metrics.len(),
        collection.warnings.len(),
        start.elapsed()
    );

    Ok(collection)
}

/// One parsed source file.
pub(crate) struct Analyzed {
    pub path: PathBuf,
    pub analysis: Arc<SourceAnalysis>,
}

/// Read and parse every source file in parallel, through the tree's cache.
///
/// Files that cannot be read or parsed become [`SOURCE_WARNING`] warnings.
/// Results keep the tree's path order.
pub(crate) fn analyze_sources(
    tree: &dyn SourceTree,
    cancel: &CancellationToken,
) -> Result<(Vec<Analyzed>, Vec<CollectorWarning>), Cancelled> {
    let files = tree.source_files();

    let results: Vec<Option<Result<Analyzed, CollectorWarning>>> = files
        .par_iter()
        .map(|(path, language)| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(analyze_one(tree, path, *language))
        })
        .collect();
    cancel.check()?;

    let mut analyzed = Vec::with_capacity(results.len());
    let mut warnings = Vec::new();
    for result in results.into_iter().flatten() {
        match result {
            Ok(a) => analyzed.push(a),
            Err(w) => {
                debug!("{}", w);
                warnings.push(w);
            }
        }
    }
    Ok((analyzed, warnings))
}

fn analyze_one(
    tree: &dyn SourceTree,
    path: &Path,
    language: crate::tree::Language,
) -> Result<Analyzed, CollectorWarning> {
    let content = tree
        .read(path)
        .map_err(|e| CollectorWarning::new(SOURCE_WARNING, path, format!("unreadable: {}", e)))?;
    let analysis = tree
        .analyses()
        .get_or_analyze(path, language, &content)
        .map_err(|e| CollectorWarning::new(SOURCE_WARNING, path, format!("unparseable: {}", e)))?;
    Ok(Analyzed {
        path: path.to_path_buf(),
        analysis,
    })
}
