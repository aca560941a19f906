//! Error types for the conversation engine.
//!
//! Two families with different propagation rules:
//!
//! - `ChatLogError`: Caller/programming errors (role ordering, duplicate
//!   native payloads). Not recoverable; they abort the turn and propagate
//!   to the immediate caller.
//! - `ProvisionError`: Recoverable provisioning failures. Caught once at
//!   the provisioning boundary and carried together with a ready-to-display
//!   response bound to the conversation id, so the platform can choose to
//!   log or display it.
//!
//! Tool failures are not errors at this level; they are captured as
//! structured data inside tool-result entries.

use amber_hearth_core::ConversationId;
use amber_hearth_llm::{ApiError, TemplateError};
use std::fmt;

/// Errors from chat log operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLogError {
    /// A content append violated the role-ordering state machine.
    InvalidState { reason: String },
    /// Tool calls were supplied but the session has no resolved
    /// capability set.
    NoLlmApi,
    /// A second native payload arrived for one in-progress entry.
    DuplicateNativeContent,
}

impl ChatLogError {
    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ChatLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState { reason } => write!(f, "invalid chat log state: {reason}"),
            Self::NoLlmApi => write!(f, "no LLM API resolved for this session"),
            Self::DuplicateNativeContent => {
                write!(f, "native content already set for this entry")
            }
        }
    }
}

impl std::error::Error for ChatLogError {}

/// A ready-to-display error response, bound to the conversation id so
/// the client can still correlate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// The conversation the failure occurred in.
    pub conversation_id: ConversationId,
    /// Text suitable for speaking or displaying to the user.
    pub speech: String,
}

/// The underlying cause of a provisioning failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionErrorKind {
    /// A requested capability API id did not resolve.
    ApiResolution(ApiError),
    /// The base instructions template failed to render.
    Template(TemplateError),
}

/// A recoverable provisioning failure plus its displayable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionError {
    /// What went wrong.
    pub kind: ProvisionErrorKind,
    /// The response to hand back to the client.
    pub response: ErrorResponse,
}

impl ProvisionError {
    pub(crate) fn api_resolution(conversation_id: ConversationId, err: ApiError) -> Self {
        Self {
            kind: ProvisionErrorKind::ApiResolution(err),
            response: ErrorResponse {
                conversation_id,
                speech: "Error preparing LLM API".to_string(),
            },
        }
    }

    pub(crate) fn template(conversation_id: ConversationId, err: TemplateError) -> Self {
        Self {
            kind: ProvisionErrorKind::Template(err),
            response: ErrorResponse {
                conversation_id,
                speech: "Sorry, I had a problem with my instructions".to_string(),
            },
        }
    }
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProvisionErrorKind::ApiResolution(err) => {
                write!(f, "provisioning failed for {}: {err}", self.response.conversation_id)
            }
            ProvisionErrorKind::Template(err) => {
                write!(f, "provisioning failed for {}: {err}", self.response.conversation_id)
            }
        }
    }
}

impl std::error::Error for ProvisionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_log_error_display() {
        let err = ChatLogError::invalid_state("user content after user content");
        assert!(err.to_string().contains("user content after user content"));
        assert!(ChatLogError::NoLlmApi.to_string().contains("LLM API"));
    }

    #[test]
    fn provision_error_carries_response() {
        let conversation_id = ConversationId::new();
        let err = ProvisionError::api_resolution(
            conversation_id,
            ApiError::UnknownApi {
                api_id: "weather".to_string(),
            },
        );

        assert_eq!(err.response.conversation_id, conversation_id);
        assert_eq!(err.response.speech, "Error preparing LLM API");
        assert!(err.to_string().contains("weather"));
    }
}
