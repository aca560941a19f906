//! Typed content entries of a conversation.
//!
//! The chat log is an ordered sequence of these entries. `system` only
//! ever occupies index 0; the remaining roles alternate under the state
//! machine enforced by the chat log itself.

use amber_hearth_core::AgentId;
use amber_hearth_llm::{ToolCall, ToolCallOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The role of a content entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The system prompt slot.
    System,
    /// Human input.
    User,
    /// Agent output.
    Assistant,
    /// The result of one tool call.
    ToolResult,
    /// Opaque agent-private payload.
    Native,
}

/// The system prompt entry at index 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemContent {
    /// The rendered prompt text.
    pub content: String,
}

/// A human input entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContent {
    /// The input text.
    pub content: String,
}

/// An agent output entry, possibly carrying tool-call requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantContent {
    /// The agent that produced this entry.
    pub agent_id: AgentId,
    /// Spoken/displayed output text, if any.
    pub content: Option<String>,
    /// Reasoning text kept separate from the output, if any.
    pub thinking_content: Option<String>,
    /// Tool calls requested by the agent, in the order issued.
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantContent {
    /// Creates an empty assistant entry for the given agent.
    #[must_use]
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            content: None,
            thinking_content: None,
            tool_calls: Vec::new(),
        }
    }

    /// Sets the output text.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the thinking text.
    #[must_use]
    pub fn with_thinking(mut self, thinking: impl Into<String>) -> Self {
        self.thinking_content = Some(thinking.into());
        self
    }

    /// Appends a tool-call request.
    #[must_use]
    pub fn with_tool_call(mut self, tool_call: ToolCall) -> Self {
        self.tool_calls.push(tool_call);
        self
    }

    /// Returns true if this entry requests any tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The result of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultContent {
    /// The agent whose entry requested the call.
    pub agent_id: AgentId,
    /// The call id this result answers.
    pub tool_call_id: String,
    /// The tool that was invoked.
    pub tool_name: String,
    /// Structured success payload or failure descriptor.
    pub outcome: ToolCallOutcome,
}

/// An opaque payload meaningful only to the agent that produced it.
///
/// Filtered out of any view assembled for a different agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeContent {
    /// The producing agent.
    pub agent_id: AgentId,
    /// The opaque payload.
    pub payload: JsonValue,
}

/// A content entry in the chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Content {
    /// The system prompt slot.
    System(SystemContent),
    /// Human input.
    User(UserContent),
    /// Agent output.
    Assistant(AssistantContent),
    /// The result of one tool call.
    ToolResult(ToolResultContent),
    /// Opaque agent-private payload.
    Native(NativeContent),
}

impl Content {
    /// Creates a system entry.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(SystemContent {
            content: content.into(),
        })
    }

    /// Creates a user entry.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(UserContent {
            content: content.into(),
        })
    }

    /// Returns the entry's role.
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::System(_) => Role::System,
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::ToolResult(_) => Role::ToolResult,
            Self::Native(_) => Role::Native,
        }
    }

    /// Returns the assistant entry, if this is one.
    #[must_use]
    pub fn as_assistant(&self) -> Option<&AssistantContent> {
        match self {
            Self::Assistant(content) => Some(content),
            _ => None,
        }
    }

    /// Returns the tool-result entry, if this is one.
    #[must_use]
    pub fn as_tool_result(&self) -> Option<&ToolResultContent> {
        match self {
            Self::ToolResult(content) => Some(content),
            _ => None,
        }
    }

    /// Returns true if the entry is visible to `agent_id`.
    ///
    /// Only native entries are restricted; everything else is shared.
    #[must_use]
    pub fn visible_to(&self, agent_id: Option<&AgentId>) -> bool {
        match self {
            Self::Native(native) => agent_id == Some(&native.agent_id),
            _ => true,
        }
    }
}
