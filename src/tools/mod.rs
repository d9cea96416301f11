//! Tool executors.
//!
//! A [`ToolExecutor`] maps a tool name and its named arguments to a handler. Two
//! variants are provided: [`CallableToolExecutor`] over free functions and
//! [`MethodToolExecutor`] over the methods of a stateful object.

mod callable;
mod method;
mod traits;

pub use callable::{CallableToolExecutor, CallableToolExecutorBuilder};
pub use method::{FnStateSink, MethodToolExecutor, StateChangeSink, StatefulTools};
pub use traits::{ToolExecutor, parse_arguments, settle};

pub(crate) use traits::generate_call_id;
