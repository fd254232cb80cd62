//! The same cookie contract, through the axum binding's extractor.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use gatekey::api::{self, ApiResponse};
use gatekey::context::{AuthContext, SessionAuth};
use gatekey::domain_model::NewSession;
use gatekey::infra_memory::MemorySessionAdapter;
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceExt;

#[derive(Debug, Clone, Serialize, PartialEq)]
struct TestUser {
    id: String,
}

async fn login(mut ctx: AuthContext<TestUser>) -> Response {
    let result = ctx
        .create_session(NewSession::new("alice", Utc::now() + Duration::hours(1)))
        .await;
    api::axum::seal(ctx, Json(ApiResponse::from_result(result)))
}

async fn me(ctx: AuthContext<TestUser>) -> Response {
    let result = ctx.current_user().await;
    api::axum::seal(ctx, Json(ApiResponse::from_result(result)))
}

async fn logout(mut ctx: AuthContext<TestUser>) -> Response {
    let result = ctx.delete_current_session().await;
    api::axum::seal(ctx, Json(ApiResponse::from_result(result)))
}

fn app() -> Router {
    let adapter = MemorySessionAdapter::new();
    adapter.insert_user(
        "alice",
        TestUser {
            id: "alice".to_string(),
        },
    );
    let auth = Arc::new(SessionAuth::new(Arc::new(adapter)));

    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
        .layer(api::axum::layer(auth))
}

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string())
}

fn token_of(cookie: &str) -> String {
    let (pair, _) = cookie.split_once(';').unwrap();
    pair.strip_prefix("session_id=").unwrap().to_string()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn login_me_logout_round_trip() {
    let app = app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = set_cookie(&response).expect("login must set the session cookie");
    assert!(cookie.contains("Secure"));
    let token = token_of(&cookie);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(header::COOKIE, format!("session_id={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "alice");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(header::COOKIE, format!("session_id={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cookie = set_cookie(&response).expect("logout must clear the session cookie");
    assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
}

#[tokio::test]
async fn failed_operations_emit_no_cookie() {
    let app = app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(set_cookie(&response).is_none());

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Session ID is required");
}

#[tokio::test]
async fn a_missing_layer_is_an_internal_error_not_a_panic() {
    let bare = Router::new().route("/me", get(me));

    let response = bare
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
