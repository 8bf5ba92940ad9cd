//! Token-window duplication.
//!
//! Every run of `min_tokens` consecutive normalised tokens is hashed. A run
//! that occurs at two or more non-overlapping places (checked token by token,
//! not just by hash) marks all of its lines as duplicated. The project metric
//! is duplicated code lines over total code lines, as a percentage.

use super::{analyze_sources, Cancelled, CancellationToken, Collector, CollectorOutput};
use super::{Analyzed, CollectorSummary};
use crate::models::{Metric, MetricKind};
use crate::tree::SourceTree;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

pub struct DuplicationCollector {
    min_tokens: usize,
}

impl DuplicationCollector {
    pub fn new(min_tokens: usize) -> Self {
        Self {
            min_tokens: min_tokens.max(2),
        }
    }
}

/// Token hashes and line spans for one file.
struct FileTokens {
    hashes: Vec<u64>,
    lines: Vec<(usize, usize)>,
}

impl FileTokens {
    fn from_analyzed(file: &Analyzed) -> Self {
        let tokens = &file.analysis.tokens;
        Self {
            hashes: tokens.iter().map(|t| xxh3_64(t.text.as_bytes())).collect(),
            lines: tokens.iter().map(|t| (t.start_line, t.end_line)).collect(),
        }
    }

    fn window(&self, start: usize, len: usize) -> &[u64] {
        &self.hashes[start..start + len]
    }
}

/// Position of a window: (file index, first token).
type Position = (usize, usize);

fn window_hash(window: &[u64]) -> u64 {
    let bytes: Vec<u8> = window.iter().flat_map(|h| h.to_le_bytes()).collect();
    xxh3_64(&bytes)
}

/// Lines covered by duplicated windows, per file.
fn duplicated_lines(
    files: &[FileTokens],
    k: usize,
    cancel: &CancellationToken,
) -> Result<Vec<FxHashSet<usize>>, Cancelled> {
    let mut buckets: FxHashMap<u64, Vec<Position>> = FxHashMap::default();
    for (fi, file) in files.iter().enumerate() {
        cancel.check()?;
        if file.hashes.len() < k {
            continue;
        }
        for start in 0..=file.hashes.len() - k {
            buckets
                .entry(window_hash(file.window(start, k)))
                .or_default()
                .push((fi, start));
        }
    }

    let mut dup: Vec<FxHashSet<usize>> = vec![FxHashSet::default(); files.len()];
    let mut keys: Vec<u64> = buckets
        .iter()
        .filter(|(_, positions)| positions.len() >= 2)
        .map(|(h, _)| *h)
        .collect();
    keys.sort_unstable();

    for key in keys {
        let positions = &buckets[&key];
        for group in verified_groups(files, positions, k) {
            let occurrences = non_overlapping(&group, k);
            if occurrences.len() < 2 {
                continue;
            }
            for (fi, start) in occurrences {
                for &(first, last) in &files[fi].lines[start..start + k] {
                    dup[fi].extend(first..=last);
                }
            }
        }
    }

    Ok(dup)
}

/// Split a hash bucket into groups of windows with identical tokens.
fn verified_groups(files: &[FileTokens], positions: &[Position], k: usize) -> Vec<Vec<Position>> {
    let mut groups: Vec<Vec<Position>> = Vec::new();
    for &(fi, start) in positions {
        let window = files[fi].window(start, k);
        match groups.iter_mut().find(|g| {
            let (gf, gs) = g[0];
            files[gf].window(gs, k) == window
        }) {
            Some(group) => group.push((fi, start)),
            None => groups.push(vec![(fi, start)]),
        }
    }
    groups
}

/// Greedily keep occurrences that do not overlap an earlier kept one.
fn non_overlapping(group: &[Position], k: usize) -> Vec<Position> {
    let mut sorted = group.to_vec();
    sorted.sort_unstable();
    let mut kept: Vec<Position> = Vec::new();
    for (fi, start) in sorted {
        match kept.last() {
            Some(&(lf, ls)) if lf == fi && start < ls + k => {}
            _ => kept.push((fi, start)),
        }
    }
    kept
}

impl Collector for DuplicationCollector {
    fn name(&self) -> &'static str {
        "duplication"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Duplication
    }

    fn collect(
        &self,
        tree: &dyn SourceTree,
        cancel: &CancellationToken,
    ) -> Result<CollectorOutput, Cancelled> {
        let (files, warnings) = analyze_sources(tree, cancel)?;
        let tokens: Vec<FileTokens> = files.iter().map(FileTokens::from_analyzed).collect();
        let dup = duplicated_lines(&tokens, self.min_tokens, cancel)?;

        let code_lines: usize = files.iter().map(|f| f.analysis.code_lines).sum();
        let dup_lines: usize = dup.iter().map(|d| d.len()).sum();

        let mut metrics = Vec::new();
        if code_lines > 0 {
            metrics.push(Metric::project(
                MetricKind::Duplication,
                dup_lines as f64 * 100.0 / code_lines as f64,
            ));
        }
        for (file, lines) in files.iter().zip(&dup) {
            if !lines.is_empty() && file.analysis.code_lines > 0 {
                let pct = lines.len() as f64 * 100.0 / file.analysis.code_lines as f64;
                metrics.push(Metric::file(MetricKind::Duplication, pct, &file.path));
            }
        }

        debug!(
            "{} of {} code lines duplicated (windows of {} tokens)",
            dup_lines, code_lines, self.min_tokens
        );

        let mut facts = BTreeMap::new();
        facts.insert("code_lines", code_lines as f64);
        facts.insert("duplicated_lines", dup_lines as f64);
        facts.insert(
            "files_with_duplication",
            dup.iter().filter(|d| !d.is_empty()).count() as f64,
        );

        Ok(CollectorOutput {
            summary: CollectorSummary {
                files_scanned: files.len(),
                files_skipped: warnings.len(),
                facts,
                ..Default::default()
            },
            metrics,
            warnings,
        })
    }
}
