//! Environment Variable Configuration Provider
//!
//! Read-only access to configuration via environment variables.

use super::{ConfigError, ConfigResult};

/// Prefix used by the framework's own variables (`AGENT_RUNTIME_DEBUG`, ...).
pub const ENV_PREFIX: &str = "AGENT_RUNTIME_";

/// Read-only environment variable configuration provider.
///
/// Environment variables are treated as immutable at runtime because
/// modifying them is not thread-safe (requires unsafe in Rust 1.80+).
#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment provider with no prefix
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Create an environment provider with a prefix
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Provider for the framework's `AGENT_RUNTIME_` variables
    pub fn framework() -> Self {
        Self::prefixed(ENV_PREFIX)
    }

    /// Get the full environment variable name
    fn env_key(&self, key: &str) -> String {
        let key = key.to_uppercase().replace('.', "_");
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key,
        }
    }

    pub fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        let env_key = self.env_key(key);
        match std::env::var(&env_key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    /// Interpret a variable as a flag. `1`, `true`, `yes` and `on` are truthy;
    /// anything else, including an unset variable, is false.
    pub fn get_flag(&self, key: &str) -> ConfigResult<bool> {
        Ok(self.get(key)?.is_some_and(|v| parse_flag(&v)))
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
