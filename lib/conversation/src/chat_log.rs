//! The ordered content log of one conversation.
//!
//! A chat log is owned by exactly one session and written by one turn at
//! a time. The system prompt always occupies index 0; later appends go
//! through role validation so a malformed agent cannot corrupt the
//! transcript shape.

use crate::content::{AssistantContent, Content, Role, ToolResultContent, UserContent};
use crate::delta::AssistantContentDelta;
use crate::error::ChatLogError;
use crate::orchestrator::{self, PendingToolCalls};
use amber_hearth_core::{AgentId, ConversationId};
use amber_hearth_llm::ApiInstance;
use futures::{Stream, StreamExt};
use std::fmt;
use std::sync::Arc;

/// Callback mirrored every accepted streaming fragment, e.g. for UI
/// updates while the model is still talking.
pub type DeltaListener = Arc<dyn Fn(&ChatLog, &AssistantContentDelta) + Send + Sync>;

/// The structured content log of one conversation.
pub struct ChatLog {
    conversation_id: ConversationId,
    content: Vec<Content>,
    pub(crate) llm_api: Option<Arc<ApiInstance>>,
    pub(crate) extra_system_prompt: Option<String>,
    pub(crate) delta_listener: Option<DeltaListener>,
}

impl fmt::Debug for ChatLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatLog")
            .field("conversation_id", &self.conversation_id)
            .field("content", &self.content)
            .field("llm_api", &self.llm_api.as_ref().map(|api| &api.api_id))
            .field("extra_system_prompt", &self.extra_system_prompt)
            .finish_non_exhaustive()
    }
}

impl ChatLog {
    /// Creates an empty log with an empty system prompt at index 0.
    #[must_use]
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            content: vec![Content::system("")],
            llm_api: None,
            extra_system_prompt: None,
            delta_listener: None,
        }
    }

    /// The conversation this log belongs to.
    #[must_use]
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// All entries, in append order.
    #[must_use]
    pub fn content(&self) -> &[Content] {
        &self.content
    }

    /// The capability set resolved for the current turn, if any.
    #[must_use]
    pub fn llm_api(&self) -> Option<&Arc<ApiInstance>> {
        self.llm_api.as_ref()
    }

    /// The current system prompt text.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        match self.content.first() {
            Some(Content::System(system)) => &system.content,
            _ => "",
        }
    }

    /// Replaces the system prompt at index 0.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.content[0] = Content::system(prompt);
    }

    /// Registers the streaming-fragment mirror callback.
    pub fn set_delta_listener(&mut self, listener: DeltaListener) {
        self.delta_listener = Some(listener);
    }

    /// Removes the streaming-fragment mirror callback.
    pub fn clear_delta_listener(&mut self) {
        self.delta_listener = None;
    }

    /// Entries in order, with native entries not produced by `agent_id`
    /// filtered out.
    pub fn messages_for(&self, agent_id: Option<&AgentId>) -> impl Iterator<Item = &Content> {
        self.content
            .iter()
            .filter(move |entry| entry.visible_to(agent_id))
    }

    pub(crate) fn validate_append(&self, role: Role) -> Result<(), ChatLogError> {
        // The system slot at index 0 guarantees a last entry exists.
        let Some(last) = self.content.last() else {
            return Ok(());
        };
        match role {
            Role::System => Err(ChatLogError::invalid_state(
                "system content may only occupy index 0",
            )),
            Role::User if last.role() == Role::User => Err(ChatLogError::invalid_state(
                "user content may not follow user content",
            )),
            Role::Assistant if last.role() == Role::Assistant => {
                Err(ChatLogError::invalid_state(
                    "assistant content may not follow assistant content without an \
                     intervening tool result or user entry",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Appends a user entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when the preceding entry is already a user
    /// entry.
    pub fn add_user_content(&mut self, content: UserContent) -> Result<(), ChatLogError> {
        self.validate_append(Role::User)?;
        self.content.push(Content::User(content));
        Ok(())
    }

    /// Appends a user entry from plain text.
    ///
    /// # Errors
    ///
    /// Same as [`ChatLog::add_user_content`].
    pub fn add_user(&mut self, text: impl Into<String>) -> Result<(), ChatLogError> {
        self.add_user_content(UserContent {
            content: text.into(),
        })
    }

    /// Appends an assistant entry that carries no tool calls.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when the entry carries tool-call requests
    /// (those must go through [`ChatLog::add_assistant_content_with_tools`])
    /// or when role ordering is violated.
    pub fn add_assistant_content_without_tools(
        &mut self,
        content: AssistantContent,
    ) -> Result<(), ChatLogError> {
        if content.has_tool_calls() {
            return Err(ChatLogError::invalid_state(
                "assistant content with tool calls must be added with tools",
            ));
        }
        self.validate_append(Role::Assistant)?;
        self.content.push(Content::Assistant(content));
        Ok(())
    }

    /// Appends an assistant entry and executes its tool calls.
    ///
    /// Returns a lazy stream of tool-result entries; each is appended to
    /// the log as its call resolves and yielded in request order. Calls
    /// matching a pre-started execution in `pending` are awaited instead
    /// of re-started. External calls produce no implicit result.
    ///
    /// # Errors
    ///
    /// Returns `NoLlmApi` when the entry carries engine-executed tool
    /// calls but no capability set is resolved, or `InvalidState` on
    /// role-ordering violations.
    pub fn add_assistant_content_with_tools(
        &mut self,
        content: AssistantContent,
        pending: &mut PendingToolCalls,
    ) -> Result<impl Stream<Item = Content> + Send + '_, ChatLogError> {
        self.validate_append(Role::Assistant)?;

        let executable = content.tool_calls.iter().any(|call| !call.external);
        let results = if executable {
            let api = Arc::clone(self.llm_api.as_ref().ok_or(ChatLogError::NoLlmApi)?);
            Some(orchestrator::call_all(
                api,
                content.agent_id.clone(),
                content.tool_calls.clone(),
                pending,
            ))
        } else {
            None
        };
        self.content.push(Content::Assistant(content));

        Ok(futures::stream::unfold(
            (self, results),
            |(log, mut results)| async move {
                let result = results.as_mut()?.next().await?;
                let entry = Content::ToolResult(result);
                log.content.push(entry.clone());
                Some((entry, (log, results)))
            },
        ))
    }

    /// Appends a tool-result entry directly.
    ///
    /// Used for externally-driven calls whose results arrive out of band.
    pub fn add_tool_result(&mut self, result: ToolResultContent) {
        self.content.push(Content::ToolResult(result));
    }

    pub(crate) fn push(&mut self, entry: Content) {
        self.content.push(entry);
    }
}
