//! Invocation context carried through a conversation turn.

use amber_hearth_core::UserId;
use serde::{Deserialize, Serialize};

/// Context describing the invocation a capability API is resolved for.
///
/// Carried from the outermost entry point into API resolution, prompt
/// rendering, and every tool invocation of the turn. Inner components
/// take it as a parameter; there is no ambient current context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Identity of the invoking platform surface, e.g. `conversation`.
    pub platform: String,
    /// The free-text user input that started the turn, if any.
    pub user_input: Option<String>,
    /// BCP-47 language of the exchange, if known.
    pub language: Option<String>,
    /// The device the exchange originates from, if any.
    pub device_id: Option<String>,
    /// The acting user from the originating security context, if any.
    pub user_id: Option<UserId>,
}

impl InvocationContext {
    /// Creates a context for the given platform surface.
    #[must_use]
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            user_input: None,
            language: None,
            device_id: None,
            user_id: None,
        }
    }

    /// Sets the free-text user input.
    #[must_use]
    pub fn with_user_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = Some(input.into());
        self
    }

    /// Sets the exchange language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the originating device.
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}
