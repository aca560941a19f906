//! Conversational-session engine for the amber-hearth platform.
//!
//! This crate keeps the running state of a natural-language exchange
//! between a user and one or more tool-invoking agents:
//!
//! - **Session Store**: Conversation sessions with idle-timeout eviction
//! - **Chat Log**: The ordered content log with role-ordering invariants
//! - **Prompt Provisioning**: Capability resolution and system-prompt rendering
//! - **Tool Orchestration**: Concurrent tool calls with in-order results
//! - **Delta Accumulation**: Streamed model output assembled into entries
//! - **Trace Recorder**: Bounded per-turn debug traces

pub mod chat_log;
pub mod content;
pub mod delta;
pub mod error;
pub mod orchestrator;
pub mod provision;
pub mod session;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;

pub use chat_log::{ChatLog, DeltaListener};
pub use content::{
    AssistantContent, Content, NativeContent, Role, SystemContent, ToolResultContent, UserContent,
};
pub use delta::AssistantContentDelta;
pub use error::{ChatLogError, ErrorResponse, ProvisionError, ProvisionErrorKind};
pub use orchestrator::{start_tool_call, PendingToolCalls, StartedToolCall};
pub use provision::{ProvisionParams, DEFAULT_BASE_PROMPT};
pub use session::{Session, SessionHandle, SessionStore, CONVERSATION_TIMEOUT};
pub use trace::{ConversationTrace, TraceEvent, TraceEventKind, TraceRecorder};
