//! Declared external dependencies per manifest.
//!
//! Recognised manifests, at any depth:
//! - `requirements.txt`: one requirement per non-blank, non-comment, non-option line
//! - `pyproject.toml`: `project.dependencies` and `tool.poetry.dependencies` (minus `python`)
//! - `package.json`: `dependencies`
//! - `Cargo.toml`: `[dependencies]`
//! - `go.mod`: `require` entries not marked `// indirect`

use super::{Cancelled, CancellationToken, Collector, CollectorOutput, CollectorSummary};
use crate::error::CollectorWarning;
use crate::models::{Metric, MetricKind};
use crate::tree::SourceTree;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

pub struct DependencyCollector;

type Parser = fn(&str) -> Result<usize, String>;

const MANIFESTS: &[(&str, Parser)] = &[
    ("requirements.txt", count_requirements),
    ("pyproject.toml", count_pyproject),
    ("package.json", count_package_json),
    ("Cargo.toml", count_cargo),
    ("go.mod", count_go_mod),
];

impl Collector for DependencyCollector {
    fn name(&self) -> &'static str {
        "dependencies"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Dependencies
    }

    fn collect(
        &self,
        tree: &dyn SourceTree,
        cancel: &CancellationToken,
    ) -> Result<CollectorOutput, Cancelled> {
        let mut manifests: Vec<(PathBuf, Parser)> = MANIFESTS
            .iter()
            .flat_map(|(name, parser)| {
                tree.files_named(name)
                    .into_iter()
                    .map(move |path| (path, *parser))
            })
            .collect();
        manifests.sort_by(|a, b| a.0.cmp(&b.0));

        let mut metrics = Vec::new();
        let mut warnings = Vec::new();
        for (path, parser) in &manifests {
            cancel.check()?;
            let counted = tree
                .read(path)
                .map_err(|e| format!("unreadable: {}", e))
                .and_then(|content| parser(&content).map_err(|e| format!("unparseable: {}", e)));
            match counted {
                Ok(n) => metrics.push(Metric::file(MetricKind::Dependencies, n as f64, path)),
                Err(message) => {
                    let w = CollectorWarning::new(self.name(), path, message);
                    warn!("{}", w);
                    warnings.push(w);
                }
            }
        }

        let mut facts = BTreeMap::new();
        facts.insert("manifests", metrics.len() as f64);
        facts.insert("declared", metrics.iter().map(|m| m.value).sum());

        Ok(CollectorOutput {
            summary: CollectorSummary {
                files_scanned: metrics.len(),
                files_skipped: warnings.len(),
                facts,
                ..Default::default()
            },
            metrics,
            warnings,
        })
    }
}

fn count_requirements(content: &str) -> Result<usize, String> {
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
        .count())
}

fn count_pyproject(content: &str) -> Result<usize, String> {
    let doc: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;

    let pep621 = doc
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
        .map(|a| a.len())
        .unwrap_or(0);

    let poetry = doc
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_table())
        .map(|t| t.keys().filter(|k| k.as_str() != "python").count())
        .unwrap_or(0);

    Ok(pep621 + poetry)
}

fn count_package_json(content: &str) -> Result<usize, String> {
    let doc: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(doc
        .get("dependencies")
        .and_then(|d| d.as_object())
        .map(|o| o.len())
        .unwrap_or(0))
}

fn count_cargo(content: &str) -> Result<usize, String> {
    let doc: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    Ok(doc
        .get("dependencies")
        .and_then(|d| d.as_table())
        .map(|t| t.len())
        .unwrap_or(0))
}

fn count_go_mod(content: &str) -> Result<usize, String> {
    let mut count = 0;
    let mut in_block = false;

    for line in content.lines().map(str::trim) {
        if in_block {
            if line == ")" {
                in_block = false;
            } else if is_direct_requirement(line) {
                count += 1;
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest.starts_with('(') {
                in_block = true;
            } else if is_direct_requirement(rest) {
                count += 1;
            }
        }
    }

    if in_block {
        return Err("unterminated require block".to_string());
    }
    Ok(count)
}

fn is_direct_requirement(entry: &str) -> bool {
    !entry.is_empty() && !entry.starts_with("//") && !entry.contains("// indirect")
}
