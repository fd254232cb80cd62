use crate::domain_model::{NewSession, SessionRecord};
use std::sync::Arc;
use tracing::warn;

/// Uniform failure signal for every adapter operation.
///
/// Validation failures are detected before any backend call. Backend-level
/// faults are caught at the adapter boundary, logged, and converted to
/// [`SessionError::Backend`] with a generic operation message, so callers
/// never need backend-specific error handling. Display messages are fixed:
/// a propagated failure compares equal to its origin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session ID is required")]
    MissingSessionId,
    #[error("User ID is required")]
    MissingUserId,
    #[error("Couldn't find session")]
    SessionNotFound,
    #[error("Session has expired")]
    SessionExpired,
    #[error("User not found")]
    UserNotFound,
    #[error("this backend has no user store; configure a user delegate adapter")]
    UserStoreUnavailable,
    #[error("this backend cannot enumerate a user's sessions; bulk deletion is unsupported")]
    BulkDeleteUnsupported,
    #[error("Something went wrong, couldn't {operation}")]
    Backend { operation: &'static str },
}

impl SessionError {
    /// Wrap a backend fault. The underlying error is logged here and never
    /// surfaced to callers.
    pub fn backend(operation: &'static str, source: impl std::fmt::Display) -> Self {
        warn!("storage backend error, couldn't {}: {}", operation, source);
        SessionError::Backend { operation }
    }

    /// True for failures meaning the backend structurally cannot perform the
    /// operation, as opposed to not-found or transient conditions.
    pub fn is_capability_unavailable(&self) -> bool {
        matches!(
            self,
            SessionError::UserStoreUnavailable | SessionError::BulkDeleteUnsupported
        )
    }
}

/// The session/user storage contract every backend implements.
///
/// A session moves `Active` → `Expired` (time reaches its expiry, no
/// deletion required) → `Deleted`. Expired and deleted sessions are both
/// observably absent to reads; whether an expired read physically removes
/// storage is a per-backend policy documented on each implementation.
///
/// `U` is the caller's user type; the contract imposes no shape on it.
#[async_trait::async_trait]
pub trait SessionAdapter<U>: Send + Sync
where
    U: Send + Sync + 'static,
{
    /// Persist a new session under a freshly generated unique identifier.
    async fn create_session(&self, new: NewSession) -> Result<SessionRecord, SessionError>;

    /// Look up a live session. An expired session is never returned.
    async fn get_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError>;

    /// Resolve the owning user of a live session. Fails with the exact
    /// failure of [`get_session`](Self::get_session) when the session cannot
    /// be resolved.
    async fn get_user_by_session_id(&self, session_id: Option<&str>) -> Result<U, SessionError>;

    /// Direct user lookup by identifier.
    async fn get_user_by_user_id(&self, user_id: Option<&str>) -> Result<U, SessionError>;

    /// Delete one session and return its last-known data. Deleting an
    /// already-absent session is a [`SessionError::SessionNotFound`] failure.
    async fn delete_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError>;

    /// Resolve the owning user of the given session, then delete all of that
    /// user's sessions. Returns the number of sessions removed.
    async fn delete_users_all_sessions(
        &self,
        session_id: Option<&str>,
    ) -> Result<u64, SessionError>;
}

pub type SharedAdapter<U> = Arc<dyn SessionAdapter<U>>;
