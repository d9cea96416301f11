//! Value types shared by the executor, tools and hooks.

mod context;
mod message;
pub mod tool;
mod usage;

pub use context::AgentContext;
pub use message::{AgentMessage, Role, ToolCall};
pub use tool::{ToolError, ToolErrorKind, ToolOutcome, ToolParameter, ToolResult, ToolSchema};
pub use usage::Usage;
