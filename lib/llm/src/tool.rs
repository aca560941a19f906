//! Tool contract for model-invoked capabilities.
//!
//! A tool is a named, schema-described external action the model may
//! request. Concrete implementations (device control, search, etc.) live
//! in the surrounding platform; this module defines only the call and
//! result shapes plus the invocation trait.

use crate::context::InvocationContext;
use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Description of a tool exposed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name within the resolved API instance.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for accepted arguments.
    pub schema: JsonValue,
}

impl ToolSpec {
    /// Creates a tool spec with an empty argument schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: serde_json::json!({}),
        }
    }

    /// Sets the argument schema.
    #[must_use]
    pub fn with_schema(mut self, schema: JsonValue) -> Self {
        self.schema = schema;
        self
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, unique within the turn; echoed by the result.
    pub id: String,
    /// Name of the tool to invoke.
    pub tool_name: String,
    /// Argument map for the invocation.
    pub tool_args: JsonValue,
    /// Whether execution is driven by the surrounding platform rather
    /// than this engine. External calls never get an implicit result.
    pub external: bool,
}

impl ToolCall {
    /// Creates an engine-executed tool call.
    #[must_use]
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>, tool_args: JsonValue) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            tool_args,
            external: false,
        }
    }

    /// Marks this call as externally driven.
    #[must_use]
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }
}

/// Structured descriptor of a failed tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    /// The condition class name, e.g. `ExecutionFailed`.
    pub kind: String,
    /// The failure message, omitted when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&ToolError> for ToolFailure {
    fn from(err: &ToolError) -> Self {
        let message = err.message();
        Self {
            kind: err.kind().to_string(),
            message: (!message.is_empty()).then(|| message.to_string()),
        }
    }
}

/// Outcome of a tool call: a structured success payload or a structured
/// failure descriptor. Failures are data, never propagated errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolCallOutcome {
    /// The tool completed and produced a payload.
    Success {
        /// The structured result payload.
        result: JsonValue,
    },
    /// The tool failed; the failure is captured as data.
    Failure {
        /// The structured failure descriptor.
        #[serde(flatten)]
        failure: ToolFailure,
    },
}

impl ToolCallOutcome {
    /// Wraps an invocation result into an outcome.
    #[must_use]
    pub fn from_result(result: Result<JsonValue, ToolFailure>) -> Self {
        match result {
            Ok(result) => Self::Success { result },
            Err(failure) => Self::Failure { failure },
        }
    }

    /// Returns true if the call succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Trait implemented by every capability exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's spec (name, description, schema).
    fn spec(&self) -> ToolSpec;

    /// Invokes the tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] describing the failure; callers convert it
    /// into a structured [`ToolFailure`] rather than propagating it.
    async fn invoke(
        &self,
        args: &JsonValue,
        context: &InvocationContext,
    ) -> Result<JsonValue, ToolError>;
}
