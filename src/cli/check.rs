//! Check command - full evaluation of a generated source tree

use super::policy::effective_policy;
use super::{Outcome, Output};
use crate::collectors::CancellationToken;
use crate::config::ProjectConfig;
use crate::maturity::MaturityLevel;
use crate::naming::{NameRequest, Namespace};
use crate::reporters;
use crate::signals::SignalSet;
use crate::verdict::{self, CheckRequest};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub struct CheckArgs {
    pub signals_file: PathBuf,
    pub policy_file: Option<PathBuf>,
    pub source_dir: PathBuf,
    pub services: Vec<String>,
    pub existing: Vec<String>,
    pub level: Option<MaturityLevel>,
    pub allow_downgrade: bool,
    pub deadline_secs: Option<u64>,
}

pub fn run(args: CheckArgs, config: ProjectConfig, output: &Output) -> Result<Outcome> {
    // all inputs are validated before any file is scanned
    let signals = SignalSet::load(&args.signals_file)
        .with_context(|| format!("Invalid signals in {}", args.signals_file.display()))?;
    let (policy, policy_source) = effective_policy(args.policy_file.as_deref(), &config)?;
    let services = args
        .services
        .iter()
        .map(|s| {
            s.parse::<NameRequest>()
                .map_err(|e| anyhow!("Invalid --service '{}': {}", s, e))
        })
        .collect::<Result<Vec<_>>>()?;

    if !args.source_dir.is_dir() {
        anyhow::bail!("Source directory does not exist: {}", args.source_dir.display());
    }

    let request = CheckRequest {
        signals,
        policy,
        policy_source,
        services,
        existing: Namespace::new(&args.existing),
        current_level: args.level,
        allow_downgrade: args.allow_downgrade,
        config,
    };

    let cancel = CancellationToken::new();
    let _deadline = args
        .deadline_secs
        .map(|secs| Deadline::arm(Duration::from_secs(secs), cancel.clone()));

    let report = verdict::run_check(&request, &args.source_dir, &cancel)
        .with_context(|| format!("Check of {} did not complete", args.source_dir.display()))?;

    output.print(&reporters::report_with_format(
        &report,
        output.format,
        output.palette,
    )?);

    Ok(if report.verdict.overall_pass {
        Outcome::Pass
    } else {
        Outcome::Fail
    })
}

/// Timer thread that cancels collection when the deadline passes.
///
/// Dropping the guard stops the timer.
struct Deadline {
    stop: mpsc::Sender<()>,
}

impl Deadline {
    fn arm(after: Duration, cancel: CancellationToken) -> Self {
        let (stop, stopped) = mpsc::channel::<()>();
        thread::spawn(move || match stopped.recv_timeout(after) {
            Err(RecvTimeoutError::Timeout) => {
                warn!("Deadline of {:?} reached, cancelling collection", after);
                cancel.cancel();
            }
            _ => debug!("Deadline timer stopped"),
        });
        Self { stop }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        let _ = self.stop.send(());
    }
}
