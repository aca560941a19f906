//! Tool-call orchestration.
//!
//! Tool calls within one assistant entry may execute concurrently, but
//! results are always delivered FIFO by request order, matching the
//! platform guarantee that tool-call intents are narrated back in the
//! order the model issued them. Failures never propagate; they are
//! captured into structured failure descriptors.

use crate::content::ToolResultContent;
use amber_hearth_core::AgentId;
use amber_hearth_llm::{ApiInstance, ToolCall, ToolCallOutcome, ToolFailure};
use futures::future::BoxFuture;
use futures::stream::FuturesOrdered;
use futures::{FutureExt, Stream};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A tool call whose execution has already been dispatched.
///
/// Execution runs on a spawned task, so dropping the handle does not
/// retract the call.
#[derive(Debug)]
pub struct StartedToolCall {
    call_id: String,
    handle: JoinHandle<Result<JsonValue, ToolFailure>>,
}

impl StartedToolCall {
    /// The call id this execution answers.
    #[must_use]
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Waits for the execution to settle.
    pub async fn outcome(self) -> ToolCallOutcome {
        match self.handle.await {
            Ok(result) => ToolCallOutcome::from_result(result),
            Err(err) => ToolCallOutcome::Failure {
                failure: ToolFailure {
                    kind: "TaskFailed".to_string(),
                    message: Some(err.to_string()),
                },
            },
        }
    }
}

/// Starts executing a tool call on a spawned task.
///
/// Used for speculative execution while model output is still streaming;
/// the eventual [`call_all`] matches it back up by call id.
#[must_use]
pub fn start_tool_call(api: Arc<ApiInstance>, call: ToolCall) -> StartedToolCall {
    let call_id = call.id.clone();
    let handle = tokio::spawn(async move {
        api.invoke(&call).await.map_err(|err| {
            tracing::warn!(tool = %call.tool_name, call_id = %call.id, error = %err, "tool call failed");
            ToolFailure::from(&err)
        })
    });
    StartedToolCall { call_id, handle }
}

/// Pre-started tool executions, keyed by call id.
#[derive(Debug, Default)]
pub struct PendingToolCalls {
    started: HashMap<String, StartedToolCall>,
}

impl PendingToolCalls {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a call and records it for later matching.
    pub fn start(&mut self, api: Arc<ApiInstance>, call: ToolCall) {
        let started = start_tool_call(api, call);
        self.started.insert(started.call_id.clone(), started);
    }

    /// Records an already-dispatched execution.
    pub fn insert(&mut self, started: StartedToolCall) {
        self.started.insert(started.call_id.clone(), started);
    }

    /// Removes and returns the execution for `call_id`, if present.
    pub fn take(&mut self, call_id: &str) -> Option<StartedToolCall> {
        self.started.remove(call_id)
    }

    /// Returns true if an execution is pending for `call_id`.
    #[must_use]
    pub fn contains(&self, call_id: &str) -> bool {
        self.started.contains_key(call_id)
    }

    /// Returns the number of pending executions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.started.len()
    }

    /// Returns true if no executions are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }
}

/// Executes every non-external call, yielding results in request order.
///
/// Calls matching a pre-started execution in `pending` are awaited
/// instead of re-started; all remaining calls are dispatched now and run
/// concurrently. Emission is FIFO by request order regardless of
/// completion order. External calls are skipped entirely: the platform
/// supplies their results out of band.
pub fn call_all(
    api: Arc<ApiInstance>,
    agent_id: AgentId,
    calls: Vec<ToolCall>,
    pending: &mut PendingToolCalls,
) -> impl Stream<Item = ToolResultContent> + Send + 'static {
    let mut ordered: FuturesOrdered<BoxFuture<'static, ToolResultContent>> = FuturesOrdered::new();

    for call in calls.into_iter().filter(|call| !call.external) {
        let started = pending
            .take(&call.id)
            .unwrap_or_else(|| start_tool_call(Arc::clone(&api), call.clone()));
        let agent_id = agent_id.clone();
        ordered.push_back(
            async move {
                ToolResultContent {
                    agent_id,
                    tool_call_id: call.id,
                    tool_name: call.tool_name,
                    outcome: started.outcome().await,
                }
            }
            .boxed(),
        );
    }

    ordered
}
