//! Error types for the LLM capability layer.
//!
//! - `ToolError`: Errors from individual tool invocations. These are
//!   always recovered locally into structured failure data and never
//!   abort sibling calls or the turn.
//! - `ApiError`: Errors from capability API resolution and merging.
//! - `TemplateError`: Errors from prompt template rendering.

use std::fmt;

/// Errors from tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool with the requested name exists in the resolved API.
    ToolNotFound { name: String },
    /// The supplied arguments did not match the tool's schema.
    InvalidArguments { name: String, reason: String },
    /// The tool started but failed while executing.
    ExecutionFailed { name: String, reason: String },
    /// The task running the tool was cancelled or panicked.
    TaskFailed { name: String, reason: String },
}

impl ToolError {
    /// Returns the condition class name used in structured failure
    /// descriptors, e.g. `"ExecutionFailed"`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolNotFound { .. } => "ToolNotFound",
            Self::InvalidArguments { .. } => "InvalidArguments",
            Self::ExecutionFailed { .. } => "ExecutionFailed",
            Self::TaskFailed { .. } => "TaskFailed",
        }
    }

    /// Returns the bare failure message, without the tool name framing.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ToolNotFound { name } => name,
            Self::InvalidArguments { reason, .. }
            | Self::ExecutionFailed { reason, .. }
            | Self::TaskFailed { reason, .. } => reason,
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound { name } => write!(f, "tool not found: {name}"),
            Self::InvalidArguments { name, reason } => {
                write!(f, "invalid arguments for tool '{name}': {reason}")
            }
            Self::ExecutionFailed { name, reason } => {
                write!(f, "tool '{name}' execution failed: {reason}")
            }
            Self::TaskFailed { name, reason } => {
                write!(f, "tool '{name}' task failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ToolError {}

/// Errors from capability API resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No provider is registered under the requested id.
    UnknownApi { api_id: String },
    /// The provider exists but failed to produce an instance.
    ResolutionFailed { api_id: String, reason: String },
    /// Two merged providers expose a tool with the same name.
    DuplicateToolName { tool_name: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownApi { api_id } => write!(f, "unknown LLM API: {api_id}"),
            Self::ResolutionFailed { api_id, reason } => {
                write!(f, "failed to resolve LLM API '{api_id}': {reason}")
            }
            Self::DuplicateToolName { tool_name } => {
                write!(f, "duplicate tool name across merged APIs: {tool_name}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Errors from prompt template rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template could not be rendered against the supplied variables.
    RenderFailed { reason: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenderFailed { reason } => {
                write!(f, "failed to render prompt template: {reason}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}
