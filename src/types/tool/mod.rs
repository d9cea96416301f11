//! Tool-related types.

mod definition;
mod error;
mod output;

pub use definition::{ToolParameter, ToolSchema};
pub use error::{ToolError, ToolErrorKind};
pub use output::{ToolOutcome, ToolResult};
