//! Hook system for observing the execution loop.

mod composite;
mod logging;
mod traits;

pub use composite::CompositeHooks;
pub use logging::LoggingHooks;
pub use traits::{ExecutorHooks, HookEvent, HookPhase};
