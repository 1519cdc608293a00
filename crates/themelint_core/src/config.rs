//! Linter configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{LinterError, Severity};

/// File name looked up in the theme root and its ancestors.
pub const CONFIG_FILE_NAME: &str = ".themelint.json";

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Configuration for the linter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinterConfig {
    /// Check configuration (enable/disable/severity/settings) keyed by code.
    #[serde(default)]
    pub checks: BTreeMap<String, CheckOption>,

    /// Glob patterns of theme-relative paths that are never checked.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Path to a docset JSON file, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docset: Option<String>,

    /// Delay before an edit triggers a run.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How long a run waits for the docset.
    #[serde(default = "default_docset_timeout_ms")]
    pub docset_timeout_ms: u64,

    /// Directory containing the configuration file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_docset_timeout_ms() -> u64 {
    2_000
}

/// Configuration for a single check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckOption {
    /// Check is enabled/disabled.
    Enabled(bool),
    /// Check is enabled with a severity ("error", "warning", "info"), or "off".
    Severity(String),
    /// Object with optional `enabled`, `severity` and check settings.
    Options(Value),
}

impl CheckOption {
    /// Returns whether the check is enabled.
    pub fn is_enabled(&self) -> bool {
        match self {
            CheckOption::Enabled(enabled) => *enabled,
            CheckOption::Severity(s) => s != "off",
            CheckOption::Options(v) => {
                v.get("enabled").and_then(Value::as_bool).unwrap_or(true)
                    && v.get("severity").and_then(Value::as_str) != Some("off")
            }
        }
    }

    /// Severity override, if one is configured.
    pub fn severity(&self) -> Option<Severity> {
        let severity = match self {
            CheckOption::Enabled(_) => None,
            CheckOption::Severity(s) => Some(s.as_str()),
            CheckOption::Options(v) => v.get("severity").and_then(Value::as_str),
        };
        severity.and_then(|s| s.parse().ok())
    }

    /// Check-specific settings, without `enabled` and `severity`.
    pub fn settings(&self) -> Value {
        match self {
            CheckOption::Options(Value::Object(map)) => Value::Object(
                map.iter()
                    .filter(|(key, _)| !matches!(key.as_str(), "enabled" | "severity"))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            ),
            _ => Value::Null,
        }
    }
}

impl LinterConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self {
            checks: BTreeMap::new(),
            ignore: Vec::new(),
            docset: None,
            debounce_ms: default_debounce_ms(),
            docset_timeout_ms: default_docset_timeout_ms(),
            base_dir: None,
        }
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LinterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| LinterError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_json(&content)?;

        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }

        Ok(config)
    }

    /// Parses configuration from JSON string with schema validation.
    pub fn from_json(json: &str) -> Result<Self, LinterError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| LinterError::config(format!("Invalid JSON: {}", e)))?;

        if let Err(e) = schema()?.validate(&value) {
            return Err(LinterError::config(format!(
                "Config validation failed: {} at {}",
                e,
                e.instance_path()
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| LinterError::config(format!("Invalid config: {}", e)))
    }

    /// Finds the nearest config file in `start` or its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Loads the nearest config file, or defaults when there is none.
    pub fn load_nearest(start: &Path) -> Result<Self, LinterError> {
        match Self::discover(start) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::new()),
        }
    }

    /// Absolute path of the configured docset file.
    pub fn docset_path(&self) -> Option<PathBuf> {
        let docset = self.docset.as_ref()?;
        Some(match &self.base_dir {
            Some(base) => base.join(docset),
            None => PathBuf::from(docset),
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn docset_timeout(&self) -> Duration {
        Duration::from_millis(self.docset_timeout_ms)
    }

    /// Compiles the `ignore` patterns.
    pub fn ignore_matcher(&self) -> Result<IgnoreMatcher, LinterError> {
        IgnoreMatcher::new(&self.ignore)
    }
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn schema() -> Result<&'static Validator, LinterError> {
    CONFIG_SCHEMA
        .get_or_init(|| {
            let schema_json: Value = serde_json::from_str(SCHEMA_JSON).map_err(|e| e.to_string())?;
            Validator::new(&schema_json).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| LinterError::internal(format!("Invalid embedded config schema: {}", e)))
}

/// Compiled `ignore` globs.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    globs: Option<GlobSet>,
}

impl IgnoreMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, LinterError> {
        if patterns.is_empty() {
            return Ok(Self { globs: None });
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| LinterError::config(format!("Invalid glob pattern: {}", e)))?;
            builder.add(glob);
        }

        let globs = builder
            .build()
            .map_err(|e| LinterError::config(format!("Failed to build globset: {}", e)))?;

        Ok(Self { globs: Some(globs) })
    }

    /// Checks a theme-relative path such as `snippets/card.liquid`.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.globs
            .as_ref()
            .is_some_and(|globs| globs.is_match(relative_path))
    }
}
