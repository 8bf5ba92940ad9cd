//! End-to-end library tests: signals and policy documents on disk, a
//! generated tree in a temp directory, and the report that comes out.

use scaffold_gate::collectors::CancellationToken;
use scaffold_gate::config::load_project_config;
use scaffold_gate::maturity::MaturityLevel;
use scaffold_gate::models::{GateStatus, MetricKind};
use scaffold_gate::naming::{NameRequest, Namespace};
use scaffold_gate::policy::ThresholdPolicy;
use scaffold_gate::signals::SignalSet;
use scaffold_gate::verdict::{run_check, CheckRequest};
use std::path::Path;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

const HANDLER: &str = r#"
export function route(req, res) {
  if (req.method === "GET" && req.path === "/health") {
    return res.send("ok");
  }
  switch (req.path) {
    case "/orders":
      return listOrders(req, res);
    case "/refunds":
      return listRefunds(req, res);
    default:
      return res.status(404).send("not found");
  }
}
"#;

fn generated_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "brief.json",
        r#"{"team_size": 6, "active_users": 400, "is_in_production": true, "deployment_env_count": 3}"#,
    );
    write(root, "src/router.js", HANDLER);
    write(
        root,
        "package.json",
        r#"{"name": "orders", "dependencies": {"express": "^4", "zod": "^3"}}"#,
    );
    write(root, ".gitignore", "dist/\n");
    // ignored build output must not be scanned
    write(root, "dist/router.js", HANDLER);
    dir
}

fn request(root: &Path) -> CheckRequest {
    CheckRequest {
        signals: SignalSet::load(&root.join("brief.json")).unwrap(),
        policy: ThresholdPolicy::builtin(),
        policy_source: "builtin".into(),
        services: vec![
            NameRequest::new("shop", "orders", "api", None),
            NameRequest::new("shop", "orders", "api", Some("admin")),
        ],
        existing: Namespace::default(),
        config: load_project_config(root).unwrap(),
        ..Default::default()
    }
}

#[test]
fn test_check_generated_project() {
    let dir = generated_project();
    let report = run_check(&request(dir.path()), dir.path(), &CancellationToken::new()).unwrap();

    assert_eq!(report.verdict.maturity_level, MaturityLevel::PreProduction);
    assert!(report.verdict.overall_pass, "{}", report.summary.headline);

    // second request collides with the first and takes its qualifier
    let names: Vec<&str> = report.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["shop_orders_api", "shop_orders_admin_api"]);

    let dup = &report.verdict.gate_results[0];
    assert_eq!(dup.metric, MetricKind::Duplication);
    assert_eq!(dup.status, GateStatus::Passed);
    assert_eq!(dup.observed, Some(0.0));

    let deps = report
        .verdict
        .gate_results
        .iter()
        .find(|g| g.metric == MetricKind::Dependencies)
        .unwrap();
    assert_eq!(deps.observed, Some(2.0));

    let complexity = report
        .collectors
        .iter()
        .find(|s| s.collector == "complexity")
        .unwrap();
    assert_eq!(complexity.files_scanned, 1);
}

#[test]
fn test_check_is_deterministic() {
    let dir = generated_project();
    let req = request(dir.path());
    let a = run_check(&req, dir.path(), &CancellationToken::new()).unwrap();
    let b = run_check(&req, dir.path(), &CancellationToken::new()).unwrap();
    assert_eq!(a.verdict, b.verdict);
}

#[test]
fn test_project_config_excludes_paths() {
    let dir = generated_project();
    write(
        dir.path(),
        "scaffold-gate.toml",
        "[collectors]\nexclude = [\"src/\"]\n",
    );
    let report = run_check(&request(dir.path()), dir.path(), &CancellationToken::new()).unwrap();
    let complexity = report
        .verdict
        .gate_results
        .iter()
        .find(|g| g.metric == MetricKind::Complexity)
        .unwrap();
    // nothing left to score, so the gate holds with no observed value
    assert_eq!(complexity.status, GateStatus::Passed);
    assert_eq!(complexity.observed, None);
    assert_eq!(complexity.note.as_deref(), Some("no observations"));
}

#[test]
fn test_cancelled_run_yields_no_report() {
    let dir = generated_project();
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(run_check(&request(dir.path()), dir.path(), &cancel).is_err());
}
