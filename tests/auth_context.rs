//! Auth context semantics: captured token, staged cookie effects, and the
//! no-effect-on-failure rule.

use chrono::{Duration, Utc};
use gatekey::context::{CookieOptions, SessionAuth, TokenEffect};
use gatekey::domain_model::{Expires, NewSession, SessionRecord};
use gatekey::domain_port::{SessionAdapter, SessionError, SharedAdapter};
use gatekey::infra_memory::MemorySessionAdapter;
use std::sync::Arc;

/// Adapter whose every operation fails at the backend, for checking that no
/// cookie side effect leaks out of a failed call.
struct BrokenAdapter;

#[async_trait::async_trait]
impl SessionAdapter<String> for BrokenAdapter {
    async fn create_session(&self, _new: NewSession) -> Result<SessionRecord, SessionError> {
        Err(SessionError::Backend {
            operation: "create session",
        })
    }

    async fn get_session(&self, _session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        Err(SessionError::Backend {
            operation: "get session",
        })
    }

    async fn get_user_by_session_id(
        &self,
        _session_id: Option<&str>,
    ) -> Result<String, SessionError> {
        Err(SessionError::Backend {
            operation: "get user",
        })
    }

    async fn get_user_by_user_id(&self, _user_id: Option<&str>) -> Result<String, SessionError> {
        Err(SessionError::Backend {
            operation: "get user",
        })
    }

    async fn delete_session(
        &self,
        _session_id: Option<&str>,
    ) -> Result<SessionRecord, SessionError> {
        Err(SessionError::Backend {
            operation: "delete session",
        })
    }

    async fn delete_users_all_sessions(
        &self,
        _session_id: Option<&str>,
    ) -> Result<u64, SessionError> {
        Err(SessionError::Backend {
            operation: "delete all sessions",
        })
    }
}

fn memory_auth() -> SessionAuth<String> {
    let adapter = MemorySessionAdapter::new();
    adapter.insert_user("alice", "alice".to_string());
    SessionAuth::new(Arc::new(adapter))
}

#[tokio::test]
async fn create_session_stages_a_set_effect_with_the_session_expiry() {
    let auth = memory_auth();
    let mut ctx = auth.context(None);
    let expires_at = Utc::now() + Duration::hours(1);

    let session = ctx
        .create_session(NewSession::new("alice", expires_at))
        .await
        .unwrap();

    assert_eq!(
        ctx.pending_effect(),
        Some(&TokenEffect::Set {
            value: session.id.clone(),
            expires_at,
        })
    );
}

#[tokio::test]
async fn cookie_expiry_override_wins_over_session_expiry() {
    let override_instant = Utc::now() + Duration::days(30);
    let adapter: SharedAdapter<String> = Arc::new(MemorySessionAdapter::new());
    let auth = SessionAuth::new(adapter)
        .with_cookie(CookieOptions::default().with_expires(Expires::at(override_instant)));

    let mut ctx = auth.context(None);
    let session = ctx
        .create_session(NewSession::new("alice", Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    match ctx.pending_effect() {
        Some(TokenEffect::Set { value, expires_at }) => {
            assert_eq!(value, &session.id);
            assert_eq!(*expires_at, override_instant);
        }
        other => panic!("expected a set effect, got {:?}", other),
    }
}

#[tokio::test]
async fn relative_cookie_expiry_resolves_at_write_time() {
    let adapter: SharedAdapter<String> = Arc::new(MemorySessionAdapter::new());
    let auth = SessionAuth::new(adapter)
        .with_cookie(CookieOptions::default().with_expires(Expires::parse("2d").unwrap()));

    let mut ctx = auth.context(None);
    let before = Utc::now();
    ctx.create_session(NewSession::new("alice", Utc::now() + Duration::hours(1)))
        .await
        .unwrap();
    let after = Utc::now();

    match ctx.pending_effect() {
        Some(TokenEffect::Set { expires_at, .. }) => {
            assert!(*expires_at >= before + Duration::days(2));
            assert!(*expires_at <= after + Duration::days(2));
        }
        other => panic!("expected a set effect, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_operations_stage_no_effect() {
    let auth = SessionAuth::new(Arc::new(BrokenAdapter) as SharedAdapter<String>);
    let mut ctx = auth.context(Some("token".to_string()));

    let created = ctx
        .create_session(NewSession::new("alice", Utc::now() + Duration::hours(1)))
        .await;
    assert!(created.is_err());
    assert_eq!(ctx.pending_effect(), None);

    assert!(ctx.delete_current_session().await.is_err());
    assert_eq!(ctx.pending_effect(), None);

    assert!(ctx.delete_users_all_sessions().await.is_err());
    assert_eq!(ctx.pending_effect(), None);
}

#[tokio::test]
async fn missing_token_fails_before_any_side_effect() {
    let auth = memory_auth();
    let mut ctx = auth.context(None);

    assert_eq!(
        ctx.delete_current_session().await,
        Err(SessionError::MissingSessionId)
    );
    assert_eq!(ctx.pending_effect(), None);
}

#[tokio::test]
async fn context_reads_the_token_captured_at_construction() {
    let auth = memory_auth();
    let session = auth
        .adapter()
        .create_session(NewSession::new("alice", Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    let ctx = auth.context(Some(session.id.clone()));
    assert_eq!(ctx.token(), Some(session.id.as_str()));

    let current = ctx.current_session().await.unwrap();
    assert_eq!(current.id, session.id);

    let user = ctx.current_user().await.unwrap();
    assert_eq!(user, "alice");
}

#[tokio::test]
async fn token_extraction_from_cookie_header_respects_the_configured_name() {
    let adapter: SharedAdapter<String> = Arc::new(MemorySessionAdapter::new());
    let auth = SessionAuth::new(adapter).with_cookie(CookieOptions::named("sid"));

    let ctx = auth.context_from_cookie_header(Some("theme=dark; sid=abc123"));
    assert_eq!(ctx.token(), Some("abc123"));

    let ctx = auth.context_from_cookie_header(Some("session_id=abc123"));
    assert_eq!(ctx.token(), None);
}

#[tokio::test]
async fn delete_current_session_stages_a_clear_effect_once() {
    let auth = memory_auth();
    let session = auth
        .adapter()
        .create_session(NewSession::new("alice", Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    let mut ctx = auth.context(Some(session.id.clone()));
    ctx.delete_current_session().await.unwrap();

    assert_eq!(ctx.take_effect(), Some(TokenEffect::Clear));
    assert_eq!(ctx.take_effect(), None);
}

#[tokio::test]
async fn delete_users_all_sessions_clears_the_token() {
    let auth = memory_auth();
    let adapter = auth.adapter();
    let expires_at = Utc::now() + Duration::hours(1);

    let first = adapter
        .create_session(NewSession::new("alice", expires_at))
        .await
        .unwrap();
    adapter
        .create_session(NewSession::new("alice", expires_at))
        .await
        .unwrap();

    let mut ctx = auth.context(Some(first.id));
    let removed = ctx.delete_users_all_sessions().await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(ctx.take_effect(), Some(TokenEffect::Clear));
}
