//! Process-wide framework configuration (debug vs. production behavior).

use std::str::FromStr;
use std::sync::{OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::env::EnvConfigProvider;
use super::{ConfigError, ConfigResult};

/// Logging verbosity accepted by `AGENT_RUNTIME_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(ConfigError::InvalidValue {
                key: "log_level".into(),
                message: format!("unknown log level '{}'", other),
            }),
        }
    }
}

/// Global configuration for the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Debug mode: failures propagate, verbose logging
    pub debug: bool,
    /// Convert tool failures into `failure` results instead of raising
    pub swallow_tool_exceptions: bool,
    pub log_level: LogLevel,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            debug: false,
            swallow_tool_exceptions: true,
            log_level: LogLevel::Info,
        }
    }
}

impl FrameworkConfig {
    /// Build from `AGENT_RUNTIME_DEBUG` and `AGENT_RUNTIME_LOG_LEVEL`.
    ///
    /// An unparseable log level falls back to the mode default with a warning.
    pub fn from_env() -> Self {
        Self::from_provider(&EnvConfigProvider::framework())
    }

    pub fn from_provider(provider: &EnvConfigProvider) -> Self {
        let debug = provider.get_flag("debug").unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable debug flag");
            false
        });
        let default_level = if debug {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };

        let log_level = match provider.get("log_level") {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e: ConfigError| {
                tracing::warn!(error = %e, "Falling back to default log level");
                default_level
            }),
            Ok(None) => default_level,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable log level");
                default_level
            }
        };

        Self {
            debug,
            swallow_tool_exceptions: !debug,
            log_level,
        }
    }

    pub fn debug() -> Self {
        let mut config = Self::default();
        config.enable_debug();
        config
    }

    pub fn production() -> Self {
        Self::default()
    }

    pub fn enable_debug(&mut self) {
        self.debug = true;
        self.swallow_tool_exceptions = false;
        self.log_level = LogLevel::Debug;
    }

    pub fn enable_production(&mut self) {
        self.debug = false;
        self.swallow_tool_exceptions = true;
        self.log_level = LogLevel::Info;
    }

    /// Apply a partial update.
    ///
    /// Setting `debug` without an explicit `swallow_tool_exceptions` also sets
    /// swallowing to the opposite of `debug`.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(debug) = update.debug {
            self.debug = debug;
            if update.swallow_tool_exceptions.is_none() {
                self.swallow_tool_exceptions = !debug;
            }
        }
        if let Some(swallow) = update.swallow_tool_exceptions {
            self.swallow_tool_exceptions = swallow;
        }
        if let Some(level) = update.log_level {
            self.log_level = level;
        }
    }
}

/// Partial update for [`configure`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub debug: Option<bool>,
    pub swallow_tool_exceptions: Option<bool>,
    pub log_level: Option<LogLevel>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn swallow_tool_exceptions(mut self, swallow: bool) -> Self {
        self.swallow_tool_exceptions = Some(swallow);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Parse the log level from its textual form.
    pub fn log_level_str(self, level: &str) -> ConfigResult<Self> {
        Ok(self.log_level(level.parse()?))
    }
}

fn global() -> &'static RwLock<FrameworkConfig> {
    static CONFIG: OnceLock<RwLock<FrameworkConfig>> = OnceLock::new();
    CONFIG.get_or_init(|| RwLock::new(FrameworkConfig::from_env()))
}

/// Snapshot of the process-wide configuration.
///
/// Initialized from the environment on first access.
pub fn get_config() -> FrameworkConfig {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide configuration.
pub fn set_config(config: FrameworkConfig) {
    *global().write().unwrap_or_else(PoisonError::into_inner) = config;
}

/// Update selected fields of the process-wide configuration.
///
/// ```rust
/// use agent_runtime::config::{ConfigUpdate, configure, should_swallow_exceptions};
///
/// configure(ConfigUpdate::new().debug(true));
/// assert!(!should_swallow_exceptions());
/// # configure(ConfigUpdate::new().debug(false));
/// ```
pub fn configure(update: ConfigUpdate) {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .apply(update);
}

pub fn is_debug() -> bool {
    global().read().unwrap_or_else(PoisonError::into_inner).debug
}

pub fn should_swallow_exceptions() -> bool {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .swallow_tool_exceptions
}
