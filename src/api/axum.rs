use crate::context::{AuthContext, SessionAuth, TokenEffect, build_clear_cookie, build_set_cookie};
use axum::Extension;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::warn;

/// Install the shared auth wiring as a request extension:
///
/// ```ignore
/// let app = Router::new()
///     .route("/login", post(login))
///     .layer(gatekey::api::axum::layer(auth));
/// ```
pub fn layer<U>(auth: Arc<SessionAuth<U>>) -> Extension<Arc<SessionAuth<U>>>
where
    U: Send + Sync + 'static,
{
    Extension(auth)
}

impl<S, U> FromRequestParts<S> for AuthContext<U>
where
    S: Send + Sync,
    U: Send + Sync + 'static,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts.extensions.get::<Arc<SessionAuth<U>>>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "gatekey auth layer is not installed",
        ))?;
        let cookie_header = parts
            .headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok());
        Ok(auth.context_from_cookie_header(cookie_header))
    }
}

/// Apply the context's pending token effect to a response as a `Set-Cookie`
/// header. A context whose operations all failed carries no effect and the
/// response passes through untouched.
pub fn seal<U>(mut ctx: AuthContext<U>, response: impl IntoResponse) -> Response
where
    U: Send + Sync + 'static,
{
    let mut response = response.into_response();
    let cookie = match ctx.take_effect() {
        Some(TokenEffect::Set { value, expires_at }) => {
            build_set_cookie(ctx.cookie_options(), &value, expires_at)
        }
        Some(TokenEffect::Clear) => build_clear_cookie(ctx.cookie_options()),
        None => return response,
    };

    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("could not serialize session cookie header: {}", e),
    }
    response
}
