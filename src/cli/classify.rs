//! Classify command - map a project brief to a maturity level

use super::{Outcome, Output};
use crate::maturity::{self, MaturityLevel};
use crate::reporters::{self, ClassifyOutcome};
use crate::signals::SignalSet;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub fn run(
    signals_file: &Path,
    current_level: Option<MaturityLevel>,
    allow_downgrade: bool,
    output: &Output,
) -> Result<Outcome> {
    let signals = SignalSet::load(signals_file)
        .with_context(|| format!("Invalid signals in {}", signals_file.display()))?;

    let classification = maturity::explain(&signals);
    let transition = maturity::transition(current_level, classification.level, allow_downgrade);
    info!("Maturity level: {} ({:?})", transition.to, transition.kind);

    let outcome = ClassifyOutcome {
        classification: &classification,
        transition: &transition,
    };
    output.print(&reporters::classification(
        &outcome,
        output.format,
        output.palette,
    )?);

    Ok(Outcome::Pass)
}
