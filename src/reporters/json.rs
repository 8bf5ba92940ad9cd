//! JSON reporter
//!
//! Outputs reports as pretty-printed JSON.
//! Useful for CI pipelines, piping to jq, or further processing.

use anyhow::Result;
use serde::Serialize;

/// Render any report payload as JSON
pub fn render<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
