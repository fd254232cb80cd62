use crate::domain_model::{NewSession, SessionRecord, generate_session_id};
use crate::domain_port::{SessionAdapter, SessionError, SharedAdapter};
use dashmap::DashMap;

/// In-process adapter backed by concurrent maps.
///
/// Full capability by default. Built with [`session_only`] it behaves like a
/// cache-class backend: user operations fail with
/// [`SessionError::UserStoreUnavailable`] unless a delegate adapter is
/// configured. Expiry policy is eager: an expired session is removed on the
/// first read that observes it.
///
/// [`session_only`]: MemorySessionAdapter::session_only
pub struct MemorySessionAdapter<U> {
    sessions: DashMap<String, SessionRecord>,
    users: Option<DashMap<String, U>>,
    user_delegate: Option<SharedAdapter<U>>,
}

impl<U> MemorySessionAdapter<U>
where
    U: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        MemorySessionAdapter {
            sessions: DashMap::new(),
            users: Some(DashMap::new()),
            user_delegate: None,
        }
    }

    /// A session-only store with no user storage, mirroring a cache backend.
    pub fn session_only() -> Self {
        MemorySessionAdapter {
            sessions: DashMap::new(),
            users: None,
            user_delegate: None,
        }
    }

    /// Borrow user resolution from another adapter. The delegation is
    /// one-directional; this adapter only ever calls `get_user_by_user_id`
    /// on the delegate.
    pub fn with_user_delegate(mut self, delegate: SharedAdapter<U>) -> Self {
        self.user_delegate = Some(delegate);
        self
    }

    pub fn insert_user(&self, user_id: impl Into<String>, user: U) {
        if let Some(users) = &self.users {
            users.insert(user_id.into(), user);
        }
    }

    async fn lookup_user(&self, user_id: &str) -> Result<U, SessionError> {
        if let Some(users) = &self.users {
            return match users.get(user_id) {
                Some(user) => Ok(user.clone()),
                None => Err(SessionError::UserNotFound),
            };
        }
        match &self.user_delegate {
            Some(delegate) => delegate.get_user_by_user_id(Some(user_id)).await,
            None => Err(SessionError::UserStoreUnavailable),
        }
    }

    fn has_user_capability(&self) -> bool {
        self.users.is_some() || self.user_delegate.is_some()
    }
}

impl<U> Default for MemorySessionAdapter<U>
where
    U: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<U> SessionAdapter<U> for MemorySessionAdapter<U>
where
    U: Clone + Send + Sync + 'static,
{
    async fn create_session(&self, new: NewSession) -> Result<SessionRecord, SessionError> {
        let record = new.into_record(generate_session_id());
        self.sessions.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let id = session_id.ok_or(SessionError::MissingSessionId)?;
        let record = match self.sessions.get(id) {
            Some(record) => record.clone(),
            None => return Err(SessionError::SessionNotFound),
        };
        if record.is_expired() {
            self.sessions.remove(id);
            return Err(SessionError::SessionExpired);
        }
        Ok(record)
    }

    async fn get_user_by_session_id(&self, session_id: Option<&str>) -> Result<U, SessionError> {
        if !self.has_user_capability() {
            return Err(SessionError::UserStoreUnavailable);
        }
        let session = self.get_session(session_id).await?;
        self.lookup_user(&session.user_id).await
    }

    async fn get_user_by_user_id(&self, user_id: Option<&str>) -> Result<U, SessionError> {
        let id = user_id.ok_or(SessionError::MissingUserId)?;
        self.lookup_user(id).await
    }

    async fn delete_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let id = session_id.ok_or(SessionError::MissingSessionId)?;
        match self.sessions.remove(id) {
            None => Err(SessionError::SessionNotFound),
            Some((_, record)) if record.is_expired() => Err(SessionError::SessionExpired),
            Some((_, record)) => Ok(record),
        }
    }

    async fn delete_users_all_sessions(
        &self,
        session_id: Option<&str>,
    ) -> Result<u64, SessionError> {
        let session = self.get_session(session_id).await?;
        let mut removed = 0u64;
        self.sessions.retain(|_, record| {
            if record.user_id == session.user_id {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}
