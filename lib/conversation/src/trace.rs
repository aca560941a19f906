//! Bounded debug traces for conversation turns.
//!
//! Each turn can record a trace: an ordered list of timestamped events
//! plus an optional terminal error or result. Only the most recent
//! traces are retained, in a small ring keyed by trace id.

use amber_hearth_core::TraceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;

/// How many finished traces the recorder retains.
const STORED_TRACES: usize = 3;

/// What a trace event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventKind {
    /// Agent-internal detail, e.g. the rendered prompt or raw deltas.
    AgentDetail,
    /// A tool call and its arguments or result.
    ToolCall,
}

/// One timestamped event within a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// What the event describes.
    pub kind: TraceEventKind,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    /// Structured event payload.
    pub data: JsonValue,
}

/// The debug trace of one conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTrace {
    /// Unique trace identifier.
    pub id: TraceId,
    /// When the turn began.
    pub started_at: DateTime<Utc>,
    /// Events in recording order.
    pub events: Vec<TraceEvent>,
    /// The failure that ended the turn, if any.
    pub error: Option<String>,
    /// The turn's terminal result object, if any.
    pub result: Option<JsonValue>,
}

impl ConversationTrace {
    fn new() -> Self {
        Self {
            id: TraceId::new(),
            started_at: Utc::now(),
            events: Vec::new(),
            error: None,
            result: None,
        }
    }
}

/// Recorder holding the most recent turn traces.
///
/// Owned by the platform and passed into the turn; there is no ambient
/// global recorder. Appending without an active trace is a no-op so
/// instrumented code paths need no trace-awareness checks.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    ring: VecDeque<ConversationTrace>,
    active: Option<TraceId>,
}

impl TraceRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a new trace, makes it active, and inserts it into the
    /// ring, evicting the oldest stored trace when full.
    pub fn start_trace(&mut self) -> TraceId {
        let trace = ConversationTrace::new();
        let id = trace.id;
        if self.ring.len() == STORED_TRACES {
            self.ring.pop_front();
        }
        self.ring.push_back(trace);
        self.active = Some(id);
        id
    }

    /// Appends a timestamped event to the active trace, if any.
    pub fn append_event(&mut self, kind: TraceEventKind, data: JsonValue) {
        if let Some(trace) = self.active_trace_mut() {
            trace.events.push(TraceEvent {
                kind,
                timestamp: Utc::now(),
                data,
            });
        }
    }

    /// Records the failure that is about to end the turn and closes the
    /// active trace.
    pub fn record_error(&mut self, error: impl Into<String>) {
        if let Some(trace) = self.active_trace_mut() {
            trace.error = Some(error.into());
        }
        self.active = None;
    }

    /// Records the turn's terminal result and closes the active trace.
    pub fn record_result(&mut self, result: JsonValue) {
        if let Some(trace) = self.active_trace_mut() {
            trace.result = Some(result);
        }
        self.active = None;
    }

    /// The currently active trace, if a turn is in progress.
    #[must_use]
    pub fn active_trace(&self) -> Option<&ConversationTrace> {
        let id = self.active?;
        self.ring.iter().find(|trace| trace.id == id)
    }

    fn active_trace_mut(&mut self) -> Option<&mut ConversationTrace> {
        let id = self.active?;
        self.ring.iter_mut().find(|trace| trace.id == id)
    }

    /// The retained traces, oldest first.
    #[must_use]
    pub fn list_recent(&self) -> Vec<&ConversationTrace> {
        self.ring.iter().collect()
    }

    /// Drops all retained traces.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.active = None;
    }
}
