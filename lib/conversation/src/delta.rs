//! Delta-stream accumulation.
//!
//! Turns a lazy producer of partial model output into finished content
//! entries, executing tool calls inline. The output is pull-based:
//! dropping it stops both producer pulls and new tool-call starts, while
//! calls already dispatched keep running on their own tasks.

use crate::chat_log::ChatLog;
use crate::content::{AssistantContent, Content, NativeContent, Role, ToolResultContent};
use crate::error::ChatLogError;
use crate::orchestrator::{self, PendingToolCalls};
use amber_hearth_core::AgentId;
use amber_hearth_llm::ToolCall;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::Arc;

/// One partial update from a streaming model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantContentDelta {
    /// Opens a new in-progress entry; the first delta of a turn must be
    /// `Role(Role::Assistant)`.
    Role(Role),
    /// A fragment of output text, concatenated in arrival order.
    Content(String),
    /// A fragment of thinking text, kept in a separate buffer.
    Thinking(String),
    /// The agent-private payload; at most one per in-progress entry.
    Native(JsonValue),
    /// A fully-specified tool call; execution starts immediately.
    ToolCall(ToolCall),
    /// A result for an externally-driven call, forwarded without waiting
    /// for the in-progress entry to close.
    ToolResult(ToolResultContent),
}

#[derive(Default)]
struct PartialAssistant {
    content: Option<String>,
    thinking: Option<String>,
    native: Option<JsonValue>,
    tool_calls: Vec<ToolCall>,
}

struct AccumState<'a, S> {
    log: &'a mut ChatLog,
    deltas: S,
    agent_id: AgentId,
    current: Option<PartialAssistant>,
    started: PendingToolCalls,
    results: Option<BoxStream<'static, ToolResultContent>>,
    queue: VecDeque<Content>,
    done: bool,
}

impl<S> AccumState<'_, S> {
    fn partial_mut(&mut self) -> Result<&mut PartialAssistant, ChatLogError> {
        self.current.as_mut().ok_or_else(|| {
            ChatLogError::invalid_state("the first streamed delta must declare the assistant role")
        })
    }

    fn apply(&mut self, delta: &AssistantContentDelta) -> Result<(), ChatLogError> {
        match delta {
            AssistantContentDelta::Role(Role::Assistant) => {
                self.finalize_current()?;
                self.current = Some(PartialAssistant::default());
            }
            AssistantContentDelta::Role(other) => {
                return Err(ChatLogError::invalid_state(format!(
                    "streamed content must open with the assistant role, got {other:?}"
                )));
            }
            AssistantContentDelta::Content(text) => {
                self.partial_mut()?
                    .content
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
            AssistantContentDelta::Thinking(text) => {
                self.partial_mut()?
                    .thinking
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
            AssistantContentDelta::Native(payload) => {
                let partial = self.partial_mut()?;
                if partial.native.is_some() {
                    return Err(ChatLogError::DuplicateNativeContent);
                }
                partial.native = Some(payload.clone());
            }
            AssistantContentDelta::ToolCall(call) => {
                // Speculative start: the call is fully specified, so
                // execution begins before the entry closes. call_all
                // later matches it by id instead of re-starting.
                if !call.external
                    && let Some(api) = self.log.llm_api.as_ref()
                {
                    self.started.start(Arc::clone(api), call.clone());
                }
                self.partial_mut()?.tool_calls.push(call.clone());
            }
            AssistantContentDelta::ToolResult(result) => {
                if self.current.is_none() {
                    return Err(ChatLogError::invalid_state(
                        "the first streamed delta must declare the assistant role",
                    ));
                }
                let entry = Content::ToolResult(result.clone());
                self.log.push(entry.clone());
                self.queue.push_back(entry);
            }
        }
        Ok(())
    }

    fn finalize_current(&mut self) -> Result<(), ChatLogError> {
        let Some(partial) = self.current.take() else {
            return Ok(());
        };

        let content = AssistantContent {
            agent_id: self.agent_id.clone(),
            content: partial.content,
            thinking_content: partial.thinking,
            tool_calls: partial.tool_calls,
        };
        self.log.validate_append(Role::Assistant)?;

        let executable = content.tool_calls.iter().any(|call| !call.external);
        let api = if executable {
            Some(Arc::clone(
                self.log.llm_api.as_ref().ok_or(ChatLogError::NoLlmApi)?,
            ))
        } else {
            None
        };

        let tool_calls = content.tool_calls.clone();
        let entry = Content::Assistant(content);
        self.log.push(entry.clone());
        self.queue.push_back(entry);

        if let Some(payload) = partial.native {
            let entry = Content::Native(NativeContent {
                agent_id: self.agent_id.clone(),
                payload,
            });
            self.log.push(entry.clone());
            self.queue.push_back(entry);
        }

        if let Some(api) = api {
            self.results = Some(
                orchestrator::call_all(api, self.agent_id.clone(), tool_calls, &mut self.started)
                    .boxed(),
            );
        }
        Ok(())
    }
}

impl ChatLog {
    /// Consumes a producer of partial updates and emits finished content
    /// entries, appending each to the log as it completes.
    ///
    /// Tool calls are executed as soon as they are fully specified;
    /// their results are appended and yielded in request order once the
    /// carrying entry closes. Each item of the output stream is either a
    /// finished entry or the `InvalidState` / `DuplicateNativeContent` /
    /// `NoLlmApi` error that aborted accumulation.
    pub fn add_delta_content_stream<'a, S>(
        &'a mut self,
        agent_id: AgentId,
        deltas: S,
    ) -> impl Stream<Item = Result<Content, ChatLogError>> + Send + 'a
    where
        S: Stream<Item = AssistantContentDelta> + Send + Unpin + 'a,
    {
        let state = AccumState {
            log: self,
            deltas,
            agent_id,
            current: None,
            started: PendingToolCalls::new(),
            results: None,
            queue: VecDeque::new(),
            done: false,
        };

        futures::stream::try_unfold(state, |mut st| async move {
            loop {
                if let Some(entry) = st.queue.pop_front() {
                    return Ok(Some((entry, st)));
                }
                if let Some(results) = st.results.as_mut() {
                    match results.next().await {
                        Some(result) => {
                            let entry = Content::ToolResult(result);
                            st.log.push(entry.clone());
                            return Ok(Some((entry, st)));
                        }
                        None => {
                            st.results = None;
                            continue;
                        }
                    }
                }
                if st.done {
                    return Ok(None);
                }
                match st.deltas.next().await {
                    Some(delta) => {
                        st.apply(&delta)?;
                        if let Some(listener) = st.log.delta_listener.clone() {
                            listener(st.log, &delta);
                        }
                    }
                    None => {
                        st.done = true;
                        st.finalize_current()?;
                    }
                }
            }
        })
    }
}
