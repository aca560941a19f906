//! LLM capability and tool layer for the amber-hearth platform.
//!
//! This crate provides:
//!
//! - **Capability APIs**: Providers that expose named, schema-described
//!   tools the model may invoke, resolved fresh for each turn
//! - **Tool contract**: The `Tool` trait plus structured call/result types
//! - **Template rendering**: The substitution contract for system prompts
//! - **Identity resolution**: Display-name lookup for the acting user

pub mod api;
pub mod context;
pub mod error;
pub mod identity;
pub mod template;
pub mod tool;

pub use api::{ApiInstance, ApiRegistry, LlmApiProvider, DEFAULT_API_ID};
pub use context::InvocationContext;
pub use error::{ApiError, TemplateError, ToolError};
pub use identity::IdentityResolver;
pub use template::{SimpleTemplateRenderer, TemplateRenderer, TemplateVars};
pub use tool::{Tool, ToolCall, ToolCallOutcome, ToolFailure, ToolSpec};
