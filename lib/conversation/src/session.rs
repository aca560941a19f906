//! Conversation session lifecycle.
//!
//! Sessions are keyed by conversation id and evicted after five minutes
//! of inactivity. The store is the only structure shared across turns;
//! the session itself (and the chat log it owns) is held by exactly one
//! turn at a time via its async mutex.

use crate::chat_log::ChatLog;
use amber_hearth_core::ConversationId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// How long a session may sit idle before eviction.
pub const CONVERSATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

type CleanupFn = Box<dyn FnOnce() + Send>;

/// One conversation's session record.
pub struct Session {
    conversation_id: ConversationId,
    log: Option<ChatLog>,
    cleanup: Vec<CleanupFn>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("conversation_id", &self.conversation_id)
            .field("log", &self.log)
            .field("cleanup", &self.cleanup.len())
            .finish()
    }
}

impl Session {
    fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            log: None,
            cleanup: Vec::new(),
        }
    }

    /// The conversation this session belongs to.
    #[must_use]
    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    /// Registers a callback to run when the session is evicted.
    pub fn on_cleanup(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.cleanup.push(Box::new(callback));
    }

    /// Returns the chat log bound to this session, creating it on first
    /// access.
    ///
    /// If `initial_user_text` is supplied it is appended as a user
    /// entry. When the tail entry is already a user entry (another
    /// caller got there first within the same turn) the append is
    /// skipped silently.
    pub fn open_chat_log(&mut self, initial_user_text: Option<&str>) -> &mut ChatLog {
        let conversation_id = self.conversation_id;
        let log = self
            .log
            .get_or_insert_with(|| ChatLog::new(conversation_id));

        if let Some(text) = initial_user_text
            && let Err(err) = log.add_user(text)
        {
            tracing::debug!(
                conversation_id = %conversation_id,
                error = %err,
                "skipping duplicate user entry on chat log reopen"
            );
        }
        log
    }

    /// Returns the chat log if one has been opened.
    #[must_use]
    pub fn chat_log(&mut self) -> Option<&mut ChatLog> {
        self.log.as_mut()
    }

    fn run_cleanups(&mut self) {
        for callback in self.cleanup.drain(..) {
            callback();
        }
    }
}

/// Shared handle to a session; the holder of the lock owns the turn.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

struct SessionRecord {
    handle: SessionHandle,
    last_activity: Instant,
}

struct Inner {
    sessions: HashMap<ConversationId, SessionRecord>,
    sweep_scheduled: bool,
}

/// Store of live conversation sessions with idle-timeout eviction.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    timeout: Duration,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates a store with the platform default idle timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(CONVERSATION_TIMEOUT)
    }

    /// Creates a store with a custom idle timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                sessions: HashMap::new(),
                sweep_scheduled: false,
            })),
            timeout,
        }
    }

    fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
        inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the session for `conversation_id`, creating one if
    /// needed.
    ///
    /// A missing id yields a fresh conversation id. An id that does not
    /// parse as the platform format also yields a fresh one instead of
    /// erroring, preserving compatibility with externally supplied ids
    /// while guaranteeing the internal format. A valid but unknown id is
    /// adopted as-is.
    pub fn get_or_create(&self, conversation_id: Option<&str>) -> SessionHandle {
        let id = match conversation_id {
            None => ConversationId::new(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                let id = ConversationId::new();
                tracing::debug!(supplied = raw, replacement = %id, "replacing malformed conversation id");
                id
            }),
        };

        let mut inner = Self::lock(&self.inner);
        if let Some(record) = inner.sessions.get(&id) {
            return Arc::clone(&record.handle);
        }

        let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(Session::new(id)));
        inner.sessions.insert(
            id,
            SessionRecord {
                handle: Arc::clone(&handle),
                last_activity: Instant::now(),
            },
        );
        handle
    }

    /// Returns the live session for `conversation_id`, if any.
    #[must_use]
    pub fn get(&self, conversation_id: ConversationId) -> Option<SessionHandle> {
        Self::lock(&self.inner)
            .sessions
            .get(&conversation_id)
            .map(|record| Arc::clone(&record.handle))
    }

    /// Refreshes the session's last activity and schedules the eviction
    /// sweep if none is pending.
    ///
    /// Call at the end of a turn, while still holding the session.
    pub fn commit(&self, session: &Session) {
        let id = session.conversation_id();
        {
            let mut inner = Self::lock(&self.inner);
            match inner.sessions.get_mut(&id) {
                Some(record) => record.last_activity = Instant::now(),
                None => {
                    tracing::debug!(conversation_id = %id, "session evicted before commit");
                    return;
                }
            }
        }
        self.schedule_sweep();
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        Self::lock(&self.inner).sessions.len()
    }

    /// Returns true if no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Single-flight: at most one sweep task is pending at a time. The
    // task evicts everything idle past the timeout, then reschedules
    // itself while sessions remain.
    fn schedule_sweep(&self) {
        {
            let mut inner = Self::lock(&self.inner);
            if inner.sweep_scheduled {
                return;
            }
            inner.sweep_scheduled = true;
        }

        let inner = Arc::clone(&self.inner);
        let timeout = self.timeout;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(timeout).await;

                let expired: Vec<SessionHandle> = {
                    let mut guard = Self::lock(&inner);
                    let Some(cutoff) = Instant::now().checked_sub(timeout) else {
                        continue;
                    };
                    let ids: Vec<ConversationId> = guard
                        .sessions
                        .iter()
                        .filter(|(_, record)| record.last_activity <= cutoff)
                        .map(|(id, _)| *id)
                        .collect();
                    ids.into_iter()
                        .filter_map(|id| guard.sessions.remove(&id))
                        .map(|record| record.handle)
                        .collect()
                };

                for handle in expired {
                    let mut session = handle.lock().await;
                    tracing::debug!(conversation_id = %session.conversation_id(), "evicting idle session");
                    session.run_cleanups();
                }

                let mut guard = Self::lock(&inner);
                if guard.sessions.is_empty() {
                    guard.sweep_scheduled = false;
                    return;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Role;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn missing_id_generates_a_fresh_conversation() {
        let store = SessionStore::new();
        let handle = store.get_or_create(None);
        let session = handle.lock().await;

        assert!(store.get(session.conversation_id()).is_some());
    }

    #[tokio::test]
    async fn same_id_returns_the_same_session() {
        let store = SessionStore::new();
        let first = store.get_or_create(None);
        let id = first.lock().await.conversation_id();

        let second = store.get_or_create(Some(&id.to_string()));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn malformed_id_is_replaced_with_a_fresh_one() {
        let store = SessionStore::new();
        let handle = store.get_or_create(Some("definitely-not-a-conversation-id"));
        let session = handle.lock().await;

        assert_ne!(
            session.conversation_id().to_string(),
            "definitely-not-a-conversation-id"
        );
        assert!(store.get(session.conversation_id()).is_some());
    }

    #[tokio::test]
    async fn valid_unknown_id_is_adopted() {
        let store = SessionStore::new();
        let id = ConversationId::new();
        let handle = store.get_or_create(Some(&id.to_string()));

        assert_eq!(handle.lock().await.conversation_id(), id);
    }

    #[tokio::test]
    async fn differing_ids_yield_independent_sessions() {
        let store = SessionStore::new();
        let first = store.get_or_create(None);
        let second = store.get_or_create(None);

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_evicted_and_fresh_ones_kept() {
        let store = SessionStore::with_timeout(Duration::from_secs(300));

        let stale = store.get_or_create(None);
        let stale_id = stale.lock().await.conversation_id();
        store.commit(&*stale.lock().await);

        tokio::time::sleep(Duration::from_secs(150)).await;

        let fresh = store.get_or_create(None);
        let fresh_id = fresh.lock().await.conversation_id();
        store.commit(&*fresh.lock().await);

        // The sweep scheduled at the first commit fires at t=300.
        tokio::time::sleep(Duration::from_secs(151)).await;

        assert!(store.get(stale_id).is_none());
        assert!(store.get(fresh_id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_callbacks_fire_on_eviction() {
        let store = SessionStore::with_timeout(Duration::from_secs(60));
        let cleaned = Arc::new(AtomicBool::new(false));

        let handle = store.get_or_create(None);
        {
            let mut session = handle.lock().await;
            let flag = Arc::clone(&cleaned);
            session.on_cleanup(move || flag.store(true, Ordering::SeqCst));
            store.commit(&session);
        }

        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(cleaned.load(Ordering::SeqCst));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn reopening_the_log_is_idempotent() {
        let store = SessionStore::new();
        let handle = store.get_or_create(None);
        let mut session = handle.lock().await;

        let first_len = session.open_chat_log(None).content().len();
        let second_len = session.open_chat_log(None).content().len();
        assert_eq!(first_len, second_len);
    }

    #[tokio::test]
    async fn reopen_with_user_text_skips_a_duplicate_tail() {
        let store = SessionStore::new();
        let handle = store.get_or_create(None);
        let mut session = handle.lock().await;

        session.open_chat_log(Some("turn on the lights"));
        let log = session.open_chat_log(Some("turn on the lights"));

        let user_entries = log
            .content()
            .iter()
            .filter(|entry| entry.role() == Role::User)
            .count();
        assert_eq!(user_entries, 1);
    }
}
