//! Core domain types and utilities for the amber-hearth platform.
//!
//! This crate provides the foundational id types and error handling
//! shared by the conversational-session engine and the rest of the
//! amber-hearth home automation platform.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AgentId, ConversationId, TraceId, UserId};
