//! Framework configuration.
//!
//! ```rust,no_run
//! use agent_runtime::config::{self, ConfigUpdate, FrameworkConfig};
//!
//! // Read AGENT_RUNTIME_DEBUG / AGENT_RUNTIME_LOG_LEVEL explicitly
//! config::set_config(FrameworkConfig::from_env());
//!
//! // Or switch modes in code
//! config::configure(ConfigUpdate::new().debug(true));
//! ```

pub mod env;
mod framework;

pub use env::{ENV_PREFIX, EnvConfigProvider};
pub use framework::{
    ConfigUpdate, FrameworkConfig, LogLevel, configure, get_config, is_debug, set_config,
    should_swallow_exceptions,
};

use thiserror::Error;

/// Errors that can occur in configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The key with invalid value
        key: String,
        /// Error message
        message: String,
    },

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
