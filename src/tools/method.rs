//! Tool executor over the methods of a stateful object.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, MutexGuard};

use super::traits::ToolExecutor;
use crate::types::{ToolError, ToolSchema};

/// An object whose methods are exposed as tools.
///
/// Methods run one at a time behind a lock, so implementations may mutate `self`
/// freely. After a mutating method succeeds the current [`state`](StatefulTools::state)
/// is published to the executor's [`StateChangeSink`], if any.
#[async_trait]
pub trait StatefulTools: Send + 'static {
    type State: Send + Sync;

    /// Schemas of the methods exposed as tools.
    fn schemas(&self) -> Vec<ToolSchema>;

    fn state(&self) -> &Self::State;

    /// Whether `method` changes state. Defaults to every method.
    fn is_mutating(&self, _method: &str) -> bool {
        true
    }

    async fn call_method(
        &mut self,
        method: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ToolError>;
}

/// Receives state after a mutating tool method succeeds.
///
/// A failing sink is logged; it never changes the tool outcome.
#[async_trait]
pub trait StateChangeSink<S>: Send + Sync {
    async fn state_changed(&self, state: &S) -> crate::Result<()>;
}

/// [`StateChangeSink`] backed by a closure.
pub struct FnStateSink<F> {
    f: F,
}

impl<F> FnStateSink<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<S, F> StateChangeSink<S> for FnStateSink<F>
where
    S: Sync,
    F: Fn(&S) -> crate::Result<()> + Send + Sync,
{
    async fn state_changed(&self, state: &S) -> crate::Result<()> {
        (self.f)(state)
    }
}

/// Method-backed [`ToolExecutor`].
pub struct MethodToolExecutor<T: StatefulTools> {
    tools: Mutex<T>,
    schemas: Vec<ToolSchema>,
    sink: Option<Arc<dyn StateChangeSink<T::State>>>,
    swallow: Option<bool>,
}

impl<T: StatefulTools> MethodToolExecutor<T> {
    pub fn new(tools: T) -> Self {
        let schemas = tools.schemas();
        Self {
            tools: Mutex::new(tools),
            schemas,
            sink: None,
            swallow: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn StateChangeSink<T::State>>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Publish state changes to a closure.
    pub fn on_state_change<F>(self, f: F) -> Self
    where
        F: Fn(&T::State) -> crate::Result<()> + Send + Sync + 'static,
        T::State: 'static,
    {
        self.with_sink(Arc::new(FnStateSink::new(f)))
    }

    pub fn swallow_exceptions(mut self, swallow: bool) -> Self {
        self.swallow = Some(swallow);
        self
    }

    /// Exclusive access to the underlying object.
    pub async fn lock(&self) -> MutexGuard<'_, T> {
        self.tools.lock().await
    }

    pub async fn state(&self) -> T::State
    where
        T::State: Clone,
    {
        self.tools.lock().await.state().clone()
    }

    pub fn into_inner(self) -> T {
        self.tools.into_inner()
    }

    async fn publish(&self, method: &str, state: &T::State) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.state_changed(state).await {
            tracing::warn!(method = %method, error = %e, "State change notification failed");
        }
    }
}

#[async_trait]
impl<T: StatefulTools> ToolExecutor for MethodToolExecutor<T> {
    fn schemas(&self) -> Vec<ToolSchema> {
        self.schemas.clone()
    }

    fn swallow_override(&self) -> Option<bool> {
        self.swallow
    }

    async fn dispatch(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        if !self.schemas.iter().any(|s| s.name == name) {
            return Err(ToolError::not_found(name));
        }

        let mut tools = self.tools.lock().await;
        let value = tools.call_method(name, arguments).await?;
        if tools.is_mutating(name) {
            let state = tools.state();
            self.publish(name, state).await;
        }
        Ok(value)
    }
}
