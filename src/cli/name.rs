//! Name command - resolve one service name against existing names

use super::{Outcome, Output};
use crate::config::ProjectConfig;
use crate::naming::{NameRequest, Namespace};
use crate::reporters::{self, NameOutcome};
use anyhow::Result;
use tracing::debug;

pub fn run(
    config: &ProjectConfig,
    context: &str,
    domain: &str,
    service_type: &str,
    qualifier: Option<&str>,
    existing: &[String],
    output: &Output,
) -> Result<Outcome> {
    let namespace = Namespace::new(existing);
    debug!("Resolving against {} existing names", namespace.len());

    let request = NameRequest::new(context, domain, service_type, qualifier);
    let result = config.naming_rules().resolve(&request, &namespace);

    output.print(&reporters::naming(
        &NameOutcome::from(&result),
        output.format,
        output.palette,
    )?);

    Ok(if result.is_ok() {
        Outcome::Pass
    } else {
        Outcome::Fail
    })
}
