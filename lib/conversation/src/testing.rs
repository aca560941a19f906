//! Shared test doubles for the engine tests.

use amber_hearth_llm::{
    ApiError, ApiInstance, InvocationContext, LlmApiProvider, Tool, ToolError, ToolSpec,
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builds a single-turn API instance over the given tools.
pub fn make_api(tools: Vec<Arc<dyn Tool>>) -> Arc<ApiInstance> {
    Arc::new(ApiInstance::new(
        "test",
        InvocationContext::new("conversation"),
        tools,
    ))
}

/// Echoes its arguments back as the result.
pub struct EchoTool {
    name: &'static str,
}

impl EchoTool {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name, "echoes its arguments")
    }

    async fn invoke(
        &self,
        args: &JsonValue,
        _context: &InvocationContext,
    ) -> Result<JsonValue, ToolError> {
        Ok(args.clone())
    }
}

/// Sleeps before answering, for completion-order tests.
pub struct SleepyTool {
    name: &'static str,
    millis: u64,
}

impl SleepyTool {
    pub fn new(name: &'static str, millis: u64) -> Self {
        Self { name, millis }
    }
}

#[async_trait]
impl Tool for SleepyTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name, "sleeps, then answers")
    }

    async fn invoke(
        &self,
        _args: &JsonValue,
        _context: &InvocationContext,
    ) -> Result<JsonValue, ToolError> {
        tokio::time::sleep(Duration::from_millis(self.millis)).await;
        Ok(serde_json::json!({"slept_ms": self.millis}))
    }
}

/// Always fails with the configured reason.
pub struct FailingTool {
    name: &'static str,
    reason: &'static str,
}

impl FailingTool {
    pub fn new(name: &'static str, reason: &'static str) -> Self {
        Self { name, reason }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name, "always fails")
    }

    async fn invoke(
        &self,
        _args: &JsonValue,
        _context: &InvocationContext,
    ) -> Result<JsonValue, ToolError> {
        Err(ToolError::ExecutionFailed {
            name: self.name.to_string(),
            reason: self.reason.to_string(),
        })
    }
}

/// Counts invocations, for deduplication tests.
pub struct CountingTool {
    name: &'static str,
    pub invocations: AtomicUsize,
}

impl CountingTool {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            invocations: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(self.name, "counts invocations")
    }

    async fn invoke(
        &self,
        _args: &JsonValue,
        _context: &InvocationContext,
    ) -> Result<JsonValue, ToolError> {
        let count = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(serde_json::json!({"invocations": count}))
    }
}

/// Capability provider resolving to a fixed tool set and prompt.
pub struct StaticProvider {
    pub id: &'static str,
    pub prompt: Option<&'static str>,
    pub tools: Vec<Arc<dyn Tool>>,
}

#[async_trait]
impl LlmApiProvider for StaticProvider {
    fn id(&self) -> &str {
        self.id
    }

    async fn resolve(&self, context: &InvocationContext) -> Result<ApiInstance, ApiError> {
        let instance = ApiInstance::new(self.id, context.clone(), self.tools.clone());
        Ok(match self.prompt {
            Some(prompt) => instance.with_api_prompt(prompt),
            None => instance,
        })
    }
}
