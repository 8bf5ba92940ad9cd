//! Signal model
//!
//! Measurable facts about a project brief. A `SignalSet` is captured once per
//! classification request and never changes afterwards.
//!
//! ```json
//! { "team_size": 4, "active_users": 50, "is_in_production": false }
//! ```
//!
//! `team_size`, `active_users` and `is_in_production` are required. The rest
//! default to "no evidence" (`0` / `false`) when absent. Unknown keys are
//! ignored.

use crate::config::load_document;
use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub const TEAM_SIZE: &str = "team_size";
pub const ACTIVE_USERS: &str = "active_users";
pub const IS_IN_PRODUCTION: &str = "is_in_production";
pub const REQUIRES_COMPLIANCE_AUDIT: &str = "requires_compliance_audit";
pub const REQUESTS_PER_SECOND: &str = "requests_per_second";
pub const DISTRIBUTED_TRACE_NEEDED: &str = "distributed_trace_needed";
pub const DEPLOYMENT_ENV_COUNT: &str = "deployment_env_count";

const KNOWN_KEYS: &[&str] = &[
    TEAM_SIZE,
    ACTIVE_USERS,
    IS_IN_PRODUCTION,
    REQUIRES_COMPLIANCE_AUDIT,
    REQUESTS_PER_SECOND,
    DISTRIBUTED_TRACE_NEEDED,
    DEPLOYMENT_ENV_COUNT,
];

/// Typed project signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct SignalSet {
    pub team_size: u32,
    pub active_users: u64,
    pub is_in_production: bool,
    pub requires_compliance_audit: bool,
    pub requests_per_second: f64,
    pub distributed_trace_needed: bool,
    pub deployment_env_count: u32,
}

/// A signal value as the rule table sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalValue {
    Count(u64),
    Rate(f64),
    Flag(bool),
}

impl SignalSet {
    /// Build from a flat JSON object.
    pub fn from_value(value: &Value) -> ConfigResult<Self> {
        let Value::Object(map) = value else {
            return Err(ConfigError::InvalidValue(
                "signal document must be a flat key/value object".to_string(),
            ));
        };

        for key in map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                debug!("Ignoring unknown signal `{}`", key);
            }
        }

        let team_size = required(map.get(TEAM_SIZE), TEAM_SIZE, as_count)?;
        let active_users = required(map.get(ACTIVE_USERS), ACTIVE_USERS, as_count)?;
        let is_in_production = required(map.get(IS_IN_PRODUCTION), IS_IN_PRODUCTION, as_flag)?;

        Ok(Self {
            team_size: narrow(team_size, TEAM_SIZE)?,
            active_users,
            is_in_production,
            requires_compliance_audit: optional(
                map.get(REQUIRES_COMPLIANCE_AUDIT),
                REQUIRES_COMPLIANCE_AUDIT,
                as_flag,
            )?
            .unwrap_or(false),
            requests_per_second: optional(
                map.get(REQUESTS_PER_SECOND),
                REQUESTS_PER_SECOND,
                as_rate,
            )?
            .unwrap_or(0.0),
            distributed_trace_needed: optional(
                map.get(DISTRIBUTED_TRACE_NEEDED),
                DISTRIBUTED_TRACE_NEEDED,
                as_flag,
            )?
            .unwrap_or(false),
            deployment_env_count: narrow(
                optional(map.get(DEPLOYMENT_ENV_COUNT), DEPLOYMENT_ENV_COUNT, as_count)?
                    .unwrap_or(0),
                DEPLOYMENT_ENV_COUNT,
            )?,
        })
    }

    /// Load a signal document (`.json` or `.toml`).
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let value: Value = load_document(path)?;
        let signals = Self::from_value(&value)?;
        debug!("Loaded signals from {}: {:?}", path.display(), signals);
        Ok(signals)
    }

    /// Look up a signal by its key.
    pub fn get(&self, key: &str) -> Option<SignalValue> {
        let value = match key {
            TEAM_SIZE => SignalValue::Count(self.team_size as u64),
            ACTIVE_USERS => SignalValue::Count(self.active_users),
            IS_IN_PRODUCTION => SignalValue::Flag(self.is_in_production),
            REQUIRES_COMPLIANCE_AUDIT => SignalValue::Flag(self.requires_compliance_audit),
            REQUESTS_PER_SECOND => SignalValue::Rate(self.requests_per_second),
            DISTRIBUTED_TRACE_NEEDED => SignalValue::Flag(self.distributed_trace_needed),
            DEPLOYMENT_ENV_COUNT => SignalValue::Count(self.deployment_env_count as u64),
            _ => return None,
        };
        Some(value)
    }
}

fn required<T>(
    value: Option<&Value>,
    key: &'static str,
    convert: fn(&Value, &'static str) -> ConfigResult<T>,
) -> ConfigResult<T> {
    match value {
        Some(v) => convert(v, key),
        None => Err(ConfigError::MissingSignal { key }),
    }
}

fn optional<T>(
    value: Option<&Value>,
    key: &'static str,
    convert: fn(&Value, &'static str) -> ConfigResult<T>,
) -> ConfigResult<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => convert(v, key).map(Some),
    }
}

fn as_count(value: &Value, key: &'static str) -> ConfigResult<u64> {
    value.as_u64().ok_or_else(|| ConfigError::InvalidSignal {
        key,
        expected: "a non-negative integer",
        found: value.to_string(),
    })
}

fn as_rate(value: &Value, key: &'static str) -> ConfigResult<f64> {
    match value.as_f64() {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ConfigError::InvalidSignal {
            key,
            expected: "a non-negative number",
            found: value.to_string(),
        }),
    }
}

fn as_flag(value: &Value, key: &'static str) -> ConfigResult<bool> {
    value.as_bool().ok_or_else(|| ConfigError::InvalidSignal {
        key,
        expected: "a boolean",
        found: value.to_string(),
    })
}

fn narrow(value: u64, key: &'static str) -> ConfigResult<u32> {
    u32::try_from(value).map_err(|_| ConfigError::InvalidSignal {
        key,
        expected: "an integer below 2^32",
        found: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_signal_set() {
        let signals = SignalSet::from_value(&json!({
            "team_size": 1,
            "active_users": 0,
            "is_in_production": false
        }))
        .unwrap();
        assert_eq!(signals.team_size, 1);
        assert!(!signals.requires_compliance_audit);
        assert_eq!(signals.requests_per_second, 0.0);
    }

    #[test]
    fn test_missing_required_key() {
        let err = SignalSet::from_value(&json!({"team_size": 3, "active_users": 10})).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSignal {
                key: IS_IN_PRODUCTION
            }
        ));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = SignalSet::from_value(&json!({
            "team_size": "four",
            "active_users": 10,
            "is_in_production": false
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSignal { key: TEAM_SIZE, .. }));

        let err = SignalSet::from_value(&json!({
            "team_size": 4,
            "active_users": 10,
            "is_in_production": false,
            "requests_per_second": -3.0
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSignal {
                key: REQUESTS_PER_SECOND,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let signals = SignalSet::from_value(&json!({
            "team_size": 2,
            "active_users": 5,
            "is_in_production": true,
            "favourite_colour": "teal"
        }))
        .unwrap();
        assert!(signals.is_in_production);
    }

    #[test]
    fn test_not_an_object() {
        assert!(SignalSet::from_value(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_load_toml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.toml");
        std::fs::write(
            &path,
            "team_size = 6\nactive_users = 120\nis_in_production = true\nrequests_per_second = 12.5\n",
        )
        .unwrap();
        let signals = SignalSet::load(&path).unwrap();
        assert_eq!(signals.team_size, 6);
        assert_eq!(signals.requests_per_second, 12.5);
        assert_eq!(signals.get(ACTIVE_USERS), Some(SignalValue::Count(120)));
    }
}
