//! Tool executor over a table of free handler functions.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::traits::{ToolExecutor, parse_arguments};
use crate::types::{ToolError, ToolSchema};

type Handler =
    Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, Result<Value, ToolError>> + Send + Sync>;

struct RegisteredTool {
    schema: ToolSchema,
    handler: Handler,
}

/// Callable-backed [`ToolExecutor`]: tool name → handler.
///
/// Handlers take their arguments as a `Deserialize` type, so arguments are matched by
/// field name. They may be plain functions ([`sync_tool`](CallableToolExecutorBuilder::sync_tool))
/// or return a future ([`tool`](CallableToolExecutorBuilder::tool)).
///
/// ```rust
/// use agent_runtime::{CallableToolExecutor, ToolError, ToolExecutor, ToolSchema};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Divide { a: f64, b: f64 }
///
/// # tokio_test::block_on(async {
/// let tools = CallableToolExecutor::builder()
///     .sync_tool(ToolSchema::new("divide", "Divide two numbers"), |args: Divide| {
///         if args.b == 0.0 {
///             return Err(ToolError::execution_failed("division by zero"));
///         }
///         Ok(format!("Result: {:?}", args.a / args.b))
///     })
///     .swallow_exceptions(true)
///     .build();
///
/// let result = tools.invoke("divide", serde_json::json!({"a": 10, "b": 0})).await.unwrap();
/// assert_eq!(result.error_message(), Some("division by zero"));
/// # });
/// ```
pub struct CallableToolExecutor {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
    swallow: Option<bool>,
}

impl CallableToolExecutor {
    pub fn builder() -> CallableToolExecutorBuilder {
        CallableToolExecutorBuilder::new()
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for CallableToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableToolExecutor")
            .field("tools", &self.order)
            .field("swallow", &self.swallow)
            .finish()
    }
}

#[async_trait]
impl ToolExecutor for CallableToolExecutor {
    fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.schema.clone())
            .collect()
    }

    fn swallow_override(&self) -> Option<bool> {
        self.swallow
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    async fn dispatch(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;
        (tool.handler)(arguments).await
    }
}

/// Builder for [`CallableToolExecutor`].
#[derive(Default)]
pub struct CallableToolExecutorBuilder {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
    swallow: Option<bool>,
}

impl CallableToolExecutorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async handler.
    pub fn tool<A, R, F, Fut>(self, schema: ToolSchema, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ToolError>> + Send + 'static,
    {
        let name = schema.name.clone();
        let handler: Handler = Arc::new(move |arguments: Map<String, Value>| {
            match parse_arguments::<A>(&name, arguments) {
                Ok(args) => handler(args)
                    .map(|result| result.and_then(to_value))
                    .boxed(),
                Err(e) => future::ready(Err(e)).boxed(),
            }
        });
        self.register(schema, handler)
    }

    /// Register a synchronous handler.
    ///
    /// The handler runs on tokio's blocking pool, so it may block without stalling other
    /// calls, and a tool timeout still applies to it.
    pub fn sync_tool<A, R, F>(self, schema: ToolSchema, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(A) -> Result<R, ToolError> + Send + Sync + 'static,
    {
        let name = schema.name.clone();
        let shared = Arc::new(handler);
        let handler: Handler = Arc::new(move |arguments: Map<String, Value>| {
            let name = name.clone();
            let handler = Arc::clone(&shared);
            tokio::task::spawn_blocking(move || {
                parse_arguments::<A>(&name, arguments)
                    .and_then(|args| (*handler)(args))
                    .and_then(to_value)
            })
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(ToolError::execution_failed(format!("tool task failed: {}", e)))
                })
            })
            .boxed()
        });
        self.register(schema, handler)
    }

    /// Register a handler over the raw argument object.
    pub fn raw_tool<F, Fut>(self, schema: ToolSchema, handler: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let handler: Handler =
            Arc::new(move |arguments: Map<String, Value>| handler(arguments).boxed());
        self.register(schema, handler)
    }

    /// Pin the swallow setting instead of reading the process-wide configuration.
    pub fn swallow_exceptions(mut self, swallow: bool) -> Self {
        self.swallow = Some(swallow);
        self
    }

    pub fn build(self) -> CallableToolExecutor {
        CallableToolExecutor {
            tools: self.tools,
            order: self.order,
            swallow: self.swallow,
        }
    }

    fn register(mut self, schema: ToolSchema, handler: Handler) -> Self {
        let name = schema.name.clone();
        if self
            .tools
            .insert(name.clone(), RegisteredTool { schema, handler })
            .is_some()
        {
            tracing::debug!(tool = %name, "Replacing previously registered tool");
        } else {
            self.order.push(name);
        }
        self
    }
}

fn to_value<R: Serialize>(result: R) -> Result<Value, ToolError> {
    serde_json::to_value(result)
        .map_err(|e| ToolError::execution_failed(format!("failed to serialize tool result: {}", e)))
}
