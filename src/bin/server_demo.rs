/// Demo server exposing the session lifecycle over HTTP with the in-memory
/// backend. Log in as one of the seeded users, then poke `/me`, `/session`,
/// `/logout` and `/logout_all` with the cookie the login response sets.

use anyhow::anyhow;
use clap::Parser;
use config::{Config, File};
use gatekey::api::{self, ApiResponse};
use gatekey::context::{AuthContext, CookieOptions, SessionAuth};
use gatekey::domain_model::{Expires, NewSession};
use gatekey::infra_memory::MemorySessionAdapter;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use warp::{Filter, Rejection};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long)]
    settings: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Settings {
    http: Http,
    cookie: Cookie,
    log: Log,
    session: Session,
}

#[derive(Debug, Deserialize)]
struct Http {
    address: String,
}

#[derive(Debug, Deserialize)]
struct Cookie {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Log {
    filter: String,
}

#[derive(Debug, Deserialize)]
struct Session {
    expires: String,
}

fn parse_settings(path: Option<&str>) -> anyhow::Result<Settings> {
    let mut builder = Config::builder()
        .set_default("http.address", "127.0.0.1:8080")?
        .set_default("cookie.name", "session_id")?
        .set_default("log.filter", "server_demo=debug,gatekey=debug")?
        .set_default("session.expires", "1h")?;
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path));
    }

    let settings: Settings = builder
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;
    Ok(settings)
}

#[derive(Debug, Clone, Serialize)]
struct DemoUser {
    id: String,
    name: String,
}

type Ctx = AuthContext<DemoUser>;

#[derive(Debug, Deserialize)]
struct LoginRequest {
    user_id: String,
}

async fn login(
    body: LoginRequest,
    mut ctx: Ctx,
    expires: Expires,
) -> Result<warp::reply::Response, Rejection> {
    let result = ctx
        .create_session(NewSession::new(body.user_id, expires.resolve()))
        .await;
    let reply = warp::reply::json(&ApiResponse::from_result(result));
    Ok(api::warp::seal(ctx, reply))
}

async fn me(ctx: Ctx) -> Result<warp::reply::Response, Rejection> {
    let result = ctx.current_user().await;
    let reply = warp::reply::json(&ApiResponse::from_result(result));
    Ok(api::warp::seal(ctx, reply))
}

async fn session(ctx: Ctx) -> Result<warp::reply::Response, Rejection> {
    let result = ctx.current_session().await;
    let reply = warp::reply::json(&ApiResponse::from_result(result));
    Ok(api::warp::seal(ctx, reply))
}

async fn logout(mut ctx: Ctx) -> Result<warp::reply::Response, Rejection> {
    let result = ctx.delete_current_session().await;
    let reply = warp::reply::json(&ApiResponse::from_result(result));
    Ok(api::warp::seal(ctx, reply))
}

async fn logout_all(mut ctx: Ctx) -> Result<warp::reply::Response, Rejection> {
    let result = ctx.delete_users_all_sessions().await;
    let reply = warp::reply::json(&ApiResponse::from_result(result));
    Ok(api::warp::seal(ctx, reply))
}

fn with<T: Clone + Send>(value: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&settings.log.filter)?)
        .with(fmt::layer())
        .init();
    info!(?settings);

    // Session duration is part of configuration; a bad value fails here,
    // before the server accepts traffic.
    let session_expires = Expires::parse(&settings.session.expires)?;

    let adapter = Arc::new(MemorySessionAdapter::<DemoUser>::new());
    for name in ["alice", "bob"] {
        adapter.insert_user(
            name,
            DemoUser {
                id: name.to_string(),
                name: name.to_string(),
            },
        );
    }

    let auth = Arc::new(
        SessionAuth::new(adapter)
            .with_cookie(CookieOptions::named(settings.cookie.name.clone()).with_secure(false)),
    );

    let login = warp::post()
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(api::warp::with_auth(auth.clone()))
        .and(with(session_expires.clone()))
        .and_then(login);

    let me = warp::get()
        .and(warp::path("me"))
        .and(warp::path::end())
        .and(api::warp::with_auth(auth.clone()))
        .and_then(me);

    let session = warp::get()
        .and(warp::path("session"))
        .and(warp::path::end())
        .and(api::warp::with_auth(auth.clone()))
        .and_then(session);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(api::warp::with_auth(auth.clone()))
        .and_then(logout);

    let logout_all = warp::post()
        .and(warp::path("logout_all"))
        .and(warp::path::end())
        .and(api::warp::with_auth(auth.clone()))
        .and_then(logout_all);

    let routes = login.or(me).or(session).or(logout).or(logout_all);

    let address: std::net::SocketAddr = settings.http.address.parse()?;
    info!("listening on {}", address);

    warp::serve(routes)
        .bind_with_graceful_shutdown(address, async {
            signal::ctrl_c().await.expect("Could not register SIGINT");
        })
        .1
        .await;

    Ok(())
}
