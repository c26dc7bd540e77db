//! Feature flags rolled out per user.
//!
//! Run with `cargo run -p nodnod_axum --example feature_flags`, then:
//!
//! curl localhost:8000/config -H "x-user: alice"
//! curl localhost:8000/config -H "x-user: bob"

use axum::routing::get;
use axum::{Json, Router};
use nodnod::{create_scope, Context, Node, Result};
use nodnod_axum::{nodnod_route_in, Inject, RequestHead};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct User {
  id: String,
}

#[derive(Clone, Debug)]
struct Flags {
  new_ui: bool,
  dark_mode: bool,
}

/// Rollout share per flag.
const FLAGS: &[(&str, f64)] = &[("new_ui", 0.5), ("dark_mode", 1.0)];

fn in_rollout(user_id: &str, flag: &str, share: f64) -> bool {
  let digest = Sha256::digest(format!("{}:{}", user_id, flag).as_bytes());
  let bucket = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
  (bucket as f64) / (u32::MAX as f64) < share
}

struct FlagService {
  rollout: Vec<(&'static str, f64)>,
}

impl FlagService {
  fn share(&self, flag: &str) -> f64 {
    self
      .rollout
      .iter()
      .find(|(name, _)| *name == flag)
      .map(|(_, share)| *share)
      .unwrap_or(0.0)
  }

  fn flags_for(&self, user: &User) -> Flags {
    Flags {
      new_ui: in_rollout(&user.id, "new_ui", self.share("new_ui")),
      dark_mode: in_rollout(&user.id, "dark_mode", self.share("dark_mode")),
    }
  }
}

struct CurrentUser;
impl Node for CurrentUser {
  type Output = User;
  async fn compose(ctx: &Context<'_>) -> Result<User> {
    let head = ctx.get::<RequestHead>()?;
    Ok(User {
      id: head.header("x-user").unwrap_or("anon").to_owned(),
    })
  }
}

struct UserFlags;
impl Node for UserFlags {
  type Output = Flags;
  async fn compose(ctx: &Context<'_>) -> Result<Flags> {
    let user = ctx.resolve::<CurrentUser>().await?;
    let service = ctx.get::<FlagService>()?;
    Ok(service.flags_for(&user))
  }
}

async fn config(Inject(user): Inject<CurrentUser>, Inject(flags): Inject<UserFlags>) -> Json<Value> {
  Json(json!({ "user": user.id, "new_ui": flags.new_ui, "dark_mode": flags.dark_mode }))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  let scope = create_scope(None);
  scope.set(FlagService {
    rollout: FLAGS.to_vec(),
  });

  let app = Router::new().route("/config", get(config).layer(nodnod_route_in(scope.scope())));

  let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
  tracing::info!("listening on {}", listener.local_addr()?);
  axum::serve(listener, app).await
}
