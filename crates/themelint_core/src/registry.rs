//! Check registry and configuration resolution.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::checks::{MissingTemplate, UndefinedObject, UnknownFilter};
use crate::{Check, LinterConfig, Severity};

/// A check with its configuration applied.
#[derive(Clone)]
pub struct ActiveCheck {
    pub check: Arc<dyn Check>,
    /// Severity after configuration overrides.
    pub severity: Severity,
    /// Check-specific settings.
    pub settings: Value,
}

impl ActiveCheck {
    /// Activates `check` with its default severity and no settings.
    pub fn new(check: Arc<dyn Check>) -> Self {
        let severity = check.meta().severity;
        Self {
            check,
            severity,
            settings: Value::Null,
        }
    }

    pub fn code(&self) -> &'static str {
        self.check.meta().code
    }
}

impl std::fmt::Debug for ActiveCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveCheck")
            .field("code", &self.code())
            .field("severity", &self.severity)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Set of known checks.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in check.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UndefinedObject));
        registry.register(Arc::new(UnknownFilter));
        registry.register(Arc::new(MissingTemplate));
        registry
    }

    /// Adds a check, replacing any check with the same code.
    pub fn register(&mut self, check: Arc<dyn Check>) {
        let code = check.meta().code;
        self.checks.retain(|existing| existing.meta().code != code);
        self.checks.push(check);
    }

    pub fn get(&self, code: &str) -> Option<&Arc<dyn Check>> {
        self.checks.iter().find(|check| check.meta().code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Check>> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Resolves which checks run and how, given `config`.
    ///
    /// Checks absent from the configuration run when recommended.
    pub fn active_checks(&self, config: &LinterConfig) -> Vec<ActiveCheck> {
        for code in config.checks.keys() {
            if self.get(code).is_none() {
                warn!("Unknown check '{}' in configuration", code);
            }
        }

        self.checks
            .iter()
            .filter_map(|check| {
                let meta = check.meta();
                let Some(option) = config.checks.get(meta.code) else {
                    return meta.recommended.then(|| ActiveCheck::new(Arc::clone(check)));
                };
                if !option.is_enabled() {
                    return None;
                }

                let settings = option.settings();
                if let Value::Object(map) = &settings {
                    for key in map.keys() {
                        if meta.setting(key).is_none() {
                            warn!("Unknown setting '{}' for check '{}'", key, meta.code);
                        }
                    }
                }

                Some(ActiveCheck {
                    check: Arc::clone(check),
                    severity: option.severity().unwrap_or(meta.severity),
                    settings,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|check| check.meta().code))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn codes(active: &[ActiveCheck]) -> Vec<&'static str> {
        active.iter().map(ActiveCheck::code).collect()
    }

    #[test]
    fn test_builtin() {
        let registry = CheckRegistry::builtin();
        assert_eq!(registry.len(), 3);
        assert!(registry.get("UndefinedObject").is_some());
        assert!(registry.get("Nope").is_none());
    }

    #[test]
    fn test_recommended_checks_run_by_default() {
        let registry = CheckRegistry::builtin();
        let active = registry.active_checks(&LinterConfig::new());
        assert_eq!(
            codes(&active),
            vec!["UndefinedObject", "UnknownFilter", "MissingTemplate"]
        );
        assert_eq!(active[0].severity, Severity::Warning);
    }

    #[test]
    fn test_overrides() {
        let config = LinterConfig::from_json(
            r#"{ "checks": { "UndefinedObject": "error", "UnknownFilter": "off" } }"#,
        )
        .unwrap();
        let active = CheckRegistry::builtin().active_checks(&config);

        assert_eq!(codes(&active), vec!["UndefinedObject", "MissingTemplate"]);
        assert_eq!(active[0].severity, Severity::Error);
    }

    #[test]
    fn test_register_replaces_same_code() {
        let mut registry = CheckRegistry::builtin();
        registry.register(Arc::new(UndefinedObject));
        assert_eq!(registry.len(), 3);
    }
}
