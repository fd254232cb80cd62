use crate::context::cookie::{CookieOptions, parse_cookie_header};
use crate::domain_model::{NewSession, SessionRecord};
use crate::domain_port::{SessionAdapter, SessionError, SharedAdapter};
use chrono::{DateTime, Utc};

/// Pending change to the client-visible token, applied by a framework
/// binding as a `Set-Cookie` response header.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenEffect {
    Set {
        value: String,
        expires_at: DateTime<Utc>,
    },
    Clear,
}

/// Process-wide half of the auth wiring: one adapter plus the cookie
/// configuration, shared across requests. Mints a per-request
/// [`AuthContext`] from each inbound token.
pub struct SessionAuth<U> {
    adapter: SharedAdapter<U>,
    cookie: CookieOptions,
}

impl<U> SessionAuth<U>
where
    U: Send + Sync + 'static,
{
    pub fn new(adapter: SharedAdapter<U>) -> Self {
        SessionAuth {
            adapter,
            cookie: CookieOptions::default(),
        }
    }

    pub fn with_cookie(mut self, cookie: CookieOptions) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn cookie(&self) -> &CookieOptions {
        &self.cookie
    }

    pub fn adapter(&self) -> SharedAdapter<U> {
        self.adapter.clone()
    }

    /// Bind one extracted token for the duration of a request.
    pub fn context(&self, token: Option<String>) -> AuthContext<U> {
        AuthContext {
            adapter: self.adapter.clone(),
            cookie: self.cookie.clone(),
            token,
            pending: None,
        }
    }

    /// Convenience over [`context`](Self::context): extract the token from a
    /// raw `Cookie:` request header.
    pub fn context_from_cookie_header(&self, header: Option<&str>) -> AuthContext<U> {
        let token = header.and_then(|h| parse_cookie_header(h, &self.cookie.name));
        self.context(token)
    }
}

/// Per-request bundle of session/user operations bound to one extracted
/// token. The token is captured at construction and never re-read.
///
/// The context is exclusively owned by its request scope; operations that
/// change the client-visible token take `&mut self` and record at most one
/// pending [`TokenEffect`], and only after the adapter operation succeeded,
/// so a failed operation never leaves partial cookie state.
pub struct AuthContext<U> {
    adapter: SharedAdapter<U>,
    cookie: CookieOptions,
    token: Option<String>,
    pending: Option<TokenEffect>,
}

impl<U> AuthContext<U>
where
    U: Send + Sync + 'static,
{
    /// Create a session and stage the token-write effect. The cookie expiry
    /// is the configured override, resolved now, or the session's own
    /// expiry.
    pub async fn create_session(&mut self, new: NewSession) -> Result<SessionRecord, SessionError> {
        let session = self.adapter.create_session(new).await?;
        let expires_at = match &self.cookie.expires {
            Some(expires) => expires.resolve(),
            None => session.expires_at,
        };
        self.pending = Some(TokenEffect::Set {
            value: session.id.clone(),
            expires_at,
        });
        Ok(session)
    }

    pub async fn current_session(&self) -> Result<SessionRecord, SessionError> {
        self.adapter.get_session(self.token.as_deref()).await
    }

    pub async fn current_user(&self) -> Result<U, SessionError> {
        self.adapter
            .get_user_by_session_id(self.token.as_deref())
            .await
    }

    /// Delete the current session and stage the token-clear effect.
    pub async fn delete_current_session(&mut self) -> Result<SessionRecord, SessionError> {
        let session = self.adapter.delete_session(self.token.as_deref()).await?;
        self.pending = Some(TokenEffect::Clear);
        Ok(session)
    }

    /// Delete every session of the current session's owner and stage the
    /// token-clear effect.
    pub async fn delete_users_all_sessions(&mut self) -> Result<u64, SessionError> {
        let removed = self
            .adapter
            .delete_users_all_sessions(self.token.as_deref())
            .await?;
        self.pending = Some(TokenEffect::Clear);
        Ok(removed)
    }

    /// The raw adapter, for operations beyond the current-token ones.
    pub fn adapter(&self) -> SharedAdapter<U> {
        self.adapter.clone()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn cookie_options(&self) -> &CookieOptions {
        &self.cookie
    }

    pub fn pending_effect(&self) -> Option<&TokenEffect> {
        self.pending.as_ref()
    }

    /// Hand the pending effect to the binding. At most one effect exists per
    /// context, and taking it resets the slot.
    pub fn take_effect(&mut self) -> Option<TokenEffect> {
        self.pending.take()
    }
}
