//! Run with `cargo run -p nodnod_axum --example simple`, then:
//!
//! curl localhost:8000/me -H "x-user: alice"
//! curl localhost:8000/admin -H "x-user: bob"
//! curl "localhost:8000/search?q=rust" -H "x-user: alice"

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use nodnod::{Context, Node, Result};
use nodnod_axum::{nodnod_route, HttpError, Inject, RequestHead};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

struct CurrentUser;
impl Node for CurrentUser {
  type Output = String;
  async fn compose(ctx: &Context<'_>) -> Result<String> {
    match ctx.get::<RequestHead>()?.header("x-user") {
      Some(user) if !user.is_empty() => Ok(user.to_owned()),
      _ => Err(HttpError::new(StatusCode::UNAUTHORIZED).into()),
    }
  }
}

struct RequireAdmin;
impl Node for RequireAdmin {
  type Output = ();
  async fn compose(ctx: &Context<'_>) -> Result<()> {
    let user = ctx.resolve::<CurrentUser>().await?;
    match user.as_str() {
      "alice" | "admin" => Ok(()),
      _ => Err(HttpError::new(StatusCode::FORBIDDEN).into()),
    }
  }
}

async fn me(Inject(user): Inject<CurrentUser>) -> Json<Value> {
  Json(json!({ "user": *user }))
}

async fn admin(Inject(user): Inject<CurrentUser>, _: Inject<RequireAdmin>) -> Json<Value> {
  Json(json!({ "msg": format!("welcome {}", user) }))
}

#[derive(Deserialize)]
struct Search {
  q: String,
  #[serde(default = "default_limit")]
  limit: u32,
}

fn default_limit() -> u32 {
  10
}

async fn search(Inject(user): Inject<CurrentUser>, Query(search): Query<Search>) -> Json<Value> {
  Json(json!({ "user": *user, "q": search.q, "limit": search.limit }))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  let app = Router::new()
    .route("/me", get(me).layer(nodnod_route()))
    .route("/admin", get(admin).layer(nodnod_route()))
    .route("/search", get(search).layer(nodnod_route()));

  let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
  tracing::info!("listening on {}", listener.local_addr()?);
  axum::serve(listener, app).await
}
