//! Project-level configuration support
//!
//! Loads per-project configuration from `scaffold-gate.toml` (or
//! `.scaffold-gate.json`) in the source directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # scaffold-gate.toml
//!
//! [naming]
//! soft_length_limit = 40
//! reserved = ["legacy", "internal"]
//!
//! [collectors]
//! duplication_min_tokens = 50
//! exclude = ["generated/", "vendor/"]
//!
//! [defaults]
//! format = "json"
//! policy_file = "policy.toml"
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::naming::{NamingRules, DEFAULT_SOFT_LENGTH_LIMIT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "scaffold-gate.toml";
const JSON_CONFIG_FILE_NAME: &str = ".scaffold-gate.json";

pub const DEFAULT_DUPLICATION_MIN_TOKENS: usize = 50;

/// Project configuration loaded from `scaffold-gate.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub collectors: CollectorsConfig,

    #[serde(default)]
    pub defaults: CliDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    #[serde(default = "default_soft_length_limit")]
    pub soft_length_limit: usize,

    /// Added to the built-in reserved words.
    #[serde(default)]
    pub reserved: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            soft_length_limit: DEFAULT_SOFT_LENGTH_LIMIT,
            reserved: Vec::new(),
        }
    }
}

fn default_soft_length_limit() -> usize {
    DEFAULT_SOFT_LENGTH_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectorsConfig {
    #[serde(default = "default_min_tokens")]
    pub duplication_min_tokens: usize,

    /// Path prefixes or globs excluded from collection, on top of `.gitignore`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for CollectorsConfig {
    fn default() -> Self {
        Self {
            duplication_min_tokens: DEFAULT_DUPLICATION_MIN_TOKENS,
            exclude: Vec::new(),
        }
    }
}

fn default_min_tokens() -> usize {
    DEFAULT_DUPLICATION_MIN_TOKENS
}

/// Default CLI options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliDefaults {
    /// Default output format (text, json)
    pub format: Option<String>,

    /// Threshold policy used when `--policy-file` is absent
    pub policy_file: Option<PathBuf>,
}

impl ProjectConfig {
    pub fn naming_rules(&self) -> NamingRules {
        NamingRules::default()
            .with_soft_length_limit(self.naming.soft_length_limit)
            .with_reserved(self.naming.reserved.iter().cloned())
    }

    fn validate(self, path: &Path) -> ConfigResult<Self> {
        if self.naming.soft_length_limit == 0 {
            return Err(ConfigError::parse(
                path,
                "naming.soft_length_limit must be at least 1",
            ));
        }
        if self.collectors.duplication_min_tokens < 2 {
            return Err(ConfigError::parse(
                path,
                "collectors.duplication_min_tokens must be at least 2",
            ));
        }
        if let Some(format) = &self.defaults.format {
            if !matches!(format.as_str(), "text" | "json") {
                return Err(ConfigError::parse(
                    path,
                    format!("defaults.format must be 'text' or 'json', got '{}'", format),
                ));
            }
        }
        Ok(self)
    }
}

/// Read a `.toml` or `.json` document into `T`.
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match extension.as_deref() {
        Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::parse(path, e)),
        Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e)),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load an explicitly named config file. Errors are fatal.
pub fn load_config_file(path: &Path) -> ConfigResult<ProjectConfig> {
    let config: ProjectConfig = load_document(path)?;
    let config = config.validate(path)?;
    debug!("Loaded project config from {}", path.display());
    Ok(config)
}

/// Load project configuration from `dir`.
///
/// Tries `scaffold-gate.toml` first, then `.scaffold-gate.json`. A missing
/// file means defaults; a present but malformed one is an error.
pub fn load_project_config(dir: &Path) -> ConfigResult<ProjectConfig> {
    for name in [CONFIG_FILE_NAME, JSON_CONFIG_FILE_NAME] {
        let path = dir.join(name);
        if path.is_file() {
            let mut config = load_config_file(&path)?;
            // relative policy paths are relative to the config file
            if let Some(policy) = &config.defaults.policy_file {
                if policy.is_relative() {
                    config.defaults.policy_file = Some(dir.join(policy));
                }
            }
            return Ok(config);
        }
    }

    debug!("No project config found in {}, using defaults", dir.display());
    Ok(ProjectConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_toml_config() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
[naming]
soft_length_limit = 32
reserved = ["legacy"]

[collectors]
duplication_min_tokens = 30
exclude = ["generated/"]

[defaults]
format = "json"
policy_file = "gates/policy.toml"
"#,
        )
        .unwrap();

        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.naming.soft_length_limit, 32);
        assert_eq!(config.collectors.duplication_min_tokens, 30);
        assert_eq!(config.collectors.exclude, vec!["generated/"]);
        assert_eq!(config.defaults.format.as_deref(), Some("json"));
        assert_eq!(
            config.defaults.policy_file,
            Some(dir.path().join("gates/policy.toml"))
        );

        let rules = config.naming_rules();
        assert!(rules.reserved.contains("legacy"));
        assert!(rules.reserved.contains("template"));
        assert_eq!(rules.soft_length_limit, 32);
    }

    #[test]
    fn test_load_json_config() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".scaffold-gate.json"),
            r#"{"collectors": {"duplication_min_tokens": 80}}"#,
        )
        .unwrap();

        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(config.collectors.duplication_min_tokens, 80);
        assert_eq!(config.naming.soft_length_limit, DEFAULT_SOFT_LENGTH_LIMIT);
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_project_config(dir.path()).unwrap();
        assert_eq!(
            config.collectors.duplication_min_tokens,
            DEFAULT_DUPLICATION_MIN_TOKENS
        );
        assert!(config.defaults.policy_file.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[naming]\nmax_len = 3\n").unwrap();
        let err = load_project_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[defaults]\nformat = \"xml\"\n",
        )
        .unwrap();
        assert!(load_project_config(dir.path()).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signals.yaml");
        fs::write(&path, "team_size: 3\n").unwrap();
        let err = load_document::<serde_json::Value>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_document_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_document::<serde_json::Value>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
