//! scaffold-gate
//!
//! Governance core for generated microservice projects: classify a project
//! brief into a maturity level, resolve service names under a fixed grammar,
//! collect source metrics from the generated tree, and gate them against the
//! thresholds of that level.
//!
//! ```no_run
//! use scaffold_gate::collectors::CancellationToken;
//! use scaffold_gate::signals::SignalSet;
//! use scaffold_gate::verdict::{run_check, CheckRequest};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = CheckRequest {
//!     signals: SignalSet::load(Path::new("brief.toml"))?,
//!     policy_source: "builtin".into(),
//!     ..Default::default()
//! };
//! let report = run_check(&request, Path::new("generated"), &CancellationToken::new())?;
//! println!("{}", report.summary.headline);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod collectors;
pub mod config;
pub mod error;
pub mod gate;
pub mod maturity;
pub mod models;
pub mod naming;
pub mod policy;
pub mod reporters;
pub mod signals;
pub mod syntax;
pub mod tree;
pub mod verdict;
