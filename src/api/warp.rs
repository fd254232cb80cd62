use crate::context::{AuthContext, SessionAuth, TokenEffect, build_clear_cookie, build_set_cookie};
use std::sync::Arc;
use warp::http::header::SET_COOKIE;
use warp::{Filter, Rejection, Reply};

/// Extract the session token from the request's `Cookie:` header and yield
/// a per-request [`AuthContext`].
pub fn with_auth<U>(
    auth: Arc<SessionAuth<U>>,
) -> impl Filter<Extract = (AuthContext<U>,), Error = Rejection> + Clone
where
    U: Send + Sync + 'static,
{
    warp::header::optional::<String>("cookie")
        .map(move |header: Option<String>| auth.context_from_cookie_header(header.as_deref()))
}

/// Apply the context's pending token effect to a reply as a `Set-Cookie`
/// header. A context whose operations all failed carries no effect and the
/// reply passes through untouched.
pub fn seal<U>(mut ctx: AuthContext<U>, reply: impl Reply) -> warp::reply::Response
where
    U: Send + Sync + 'static,
{
    match ctx.take_effect() {
        Some(TokenEffect::Set { value, expires_at }) => warp::reply::with_header(
            reply,
            SET_COOKIE,
            build_set_cookie(ctx.cookie_options(), &value, expires_at),
        )
        .into_response(),
        Some(TokenEffect::Clear) => warp::reply::with_header(
            reply,
            SET_COOKIE,
            build_clear_cookie(ctx.cookie_options()),
        )
        .into_response(),
        None => reply.into_response(),
    }
}
