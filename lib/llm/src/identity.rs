//! Identity resolution for the acting user.

use amber_hearth_core::UserId;
use async_trait::async_trait;

/// Resolves platform user ids to human-readable display names.
///
/// Implemented by the surrounding platform's user registry; the engine
/// only consumes it while rendering the system prompt.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the display name for the user, if known.
    async fn display_name(&self, user_id: &UserId) -> Option<String>;
}
