//! Observability for the execution loop.
//!
//! The loop emits `tracing` events and spans (`agent.run`, `llm.call`, `tool.execute`)
//! with structured fields. Any subscriber can collect them.
//!
//! ## Subscriber installation
//!
//! Enable the `subscriber` feature to install a console subscriber whose level follows
//! [`FrameworkConfig::log_level`](crate::FrameworkConfig):
//!
//! ```toml
//! agent-runtime = { version = "0.3", features = ["subscriber"] }
//! ```
//!
//! ```rust,ignore
//! use agent_runtime::{FrameworkConfig, observability};
//!
//! observability::init_tracing(&FrameworkConfig::from_env())?;
//! ```

mod spans;

pub use spans::{LlmCallSpan, SpanContext};

#[cfg(feature = "subscriber")]
pub use subscriber::{SubscriberError, init_tracing};

#[cfg(feature = "subscriber")]
mod subscriber {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    use crate::config::FrameworkConfig;

    /// Errors that can occur during subscriber installation.
    #[derive(Debug, thiserror::Error)]
    pub enum SubscriberError {
        #[error("Failed to init subscriber: {0}")]
        Init(String),
    }

    /// Install a global fmt subscriber.
    ///
    /// `RUST_LOG` takes precedence; otherwise the crate logs at the configured level.
    pub fn init_tracing(config: &FrameworkConfig) -> Result<(), SubscriberError> {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "agent_runtime={}",
                config.log_level.as_tracing_level()
            ))
        });

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.debug);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| SubscriberError::Init(e.to_string()))
    }
}
