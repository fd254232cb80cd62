use crate::domain_model::{NewSession, SessionRecord, generate_session_id};
use crate::domain_port::{SessionAdapter, SessionError, SharedAdapter};
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

const DEFAULT_PREFIX: &str = "sessions";

/// Key-value cache adapter.
///
/// Layout: key `<prefix>:<sessionId>`, value = camelCase JSON of the
/// creation options, TTL = remaining time to expiry in whole seconds.
/// Expiry policy is native: Redis TTL guarantees an expired session is
/// physically absent, so reads never need an expiry check of their own.
///
/// Redis stores no user data. User operations require a delegate adapter;
/// without one they fail with [`SessionError::UserStoreUnavailable`]. Bulk
/// deletion needs a per-user index Redis does not have and always fails
/// with [`SessionError::BulkDeleteUnsupported`].
pub struct RedisSessionAdapter<U> {
    conn: ConnectionManager,
    prefix: String,
    user_delegate: Option<SharedAdapter<U>>,
}

impl<U> RedisSessionAdapter<U>
where
    U: Send + Sync + 'static,
{
    pub fn new(conn: ConnectionManager) -> Self {
        RedisSessionAdapter {
            conn,
            prefix: DEFAULT_PREFIX.to_string(),
            user_delegate: None,
        }
    }

    /// Build the connection manager from a raw connection URL.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self::new(conn))
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Borrow user resolution from a user-capable adapter (one-directional).
    pub fn with_user_delegate(mut self, delegate: SharedAdapter<U>) -> Self {
        self.user_delegate = Some(delegate);
        self
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}:{}", self.prefix, session_id)
    }
}

/// Remaining time to expiry in whole seconds, rounded, floored at the
/// backend's one-second granularity.
fn ttl_seconds(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (expires_at - now).num_milliseconds();
    let secs = (millis as f64 / 1000.0).round();
    if secs < 1.0 { 1 } else { secs as u64 }
}

#[async_trait::async_trait]
impl<U> SessionAdapter<U> for RedisSessionAdapter<U>
where
    U: Send + Sync + 'static,
{
    async fn create_session(&self, new: NewSession) -> Result<SessionRecord, SessionError> {
        let id = generate_session_id();
        let ttl = ttl_seconds(new.expires_at, Utc::now());
        let payload = serde_json::to_string(&new)
            .map_err(|e| SessionError::backend("create session", e))?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.key(&id), payload, ttl)
            .await
            .map_err(|e| SessionError::backend("create session", e))?;

        Ok(new.into_record(id))
    }

    async fn get_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let id = session_id.ok_or(SessionError::MissingSessionId)?;

        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(self.key(id))
            .await
            .map_err(|e| SessionError::backend("get session", e))?;

        let payload = payload.ok_or(SessionError::SessionNotFound)?;
        let stored: NewSession = serde_json::from_str(&payload)
            .map_err(|e| SessionError::backend("get session", e))?;
        Ok(stored.into_record(id.to_string()))
    }

    async fn get_user_by_session_id(&self, session_id: Option<&str>) -> Result<U, SessionError> {
        let delegate = self
            .user_delegate
            .as_ref()
            .ok_or(SessionError::UserStoreUnavailable)?;
        let session = self.get_session(session_id).await?;
        delegate.get_user_by_user_id(Some(&session.user_id)).await
    }

    async fn get_user_by_user_id(&self, user_id: Option<&str>) -> Result<U, SessionError> {
        let delegate = self
            .user_delegate
            .as_ref()
            .ok_or(SessionError::UserStoreUnavailable)?;
        delegate.get_user_by_user_id(user_id).await
    }

    async fn delete_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let session = self.get_session(session_id).await?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .del(self.key(&session.id))
            .await
            .map_err(|e| SessionError::backend("delete session", e))?;
        Ok(session)
    }

    async fn delete_users_all_sessions(
        &self,
        _session_id: Option<&str>,
    ) -> Result<u64, SessionError> {
        Err(SessionError::BulkDeleteUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn ttl_rounds_to_whole_seconds() {
        let now = Utc::now();
        assert_eq!(ttl_seconds(now + Duration::milliseconds(3_600_000), now), 3600);
        assert_eq!(ttl_seconds(now + Duration::milliseconds(90_499), now), 90);
        assert_eq!(ttl_seconds(now + Duration::milliseconds(90_500), now), 91);
    }

    #[test]
    fn ttl_never_drops_below_backend_granularity() {
        let now = Utc::now();
        assert_eq!(ttl_seconds(now + Duration::milliseconds(200), now), 1);
        assert_eq!(ttl_seconds(now - Duration::seconds(10), now), 1);
    }
}
