//! Every query is scoped to the calling tenant.
//!
//! Run with `cargo run -p nodnod_axum --example tenant_isolation`, then:
//!
//! curl localhost:8000/projects -H "x-tenant: acme"
//! curl localhost:8000/projects -H "x-tenant: startup"
//! curl localhost:8000/projects -H "x-tenant: acme" -H "content-type: application/json" -d '{"name":"API"}'

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use nodnod::{create_scope, Context, Node, Result};
use nodnod_axum::{nodnod_route_in, HttpError, Inject, RequestHead, Scoped};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Tenant {
  id: &'static str,
  name: &'static str,
}

#[derive(Clone, Debug)]
struct Project {
  id: usize,
  tenant_id: &'static str,
  name: String,
}

const TENANTS: &[Tenant] = &[
  Tenant { id: "acme", name: "Acme Corp" },
  Tenant { id: "startup", name: "Startup Inc" },
];

/// Application-wide project store, shared through the app scope.
struct Projects(RwLock<Vec<Project>>);

/// Project access restricted to one tenant.
struct TenantDb {
  tenant: Tenant,
  projects: Arc<Projects>,
}

impl TenantDb {
  fn projects(&self) -> Vec<Project> {
    let projects = self.projects.0.read();
    projects
      .iter()
      .filter(|p| p.tenant_id == self.tenant.id)
      .cloned()
      .collect()
  }

  fn create_project(&self, name: String) -> Project {
    let mut projects = self.projects.0.write();
    let project = Project {
      id: projects.len() + 1,
      tenant_id: self.tenant.id,
      name,
    };
    projects.push(project.clone());
    project
  }
}

struct CurrentTenant;
impl Node for CurrentTenant {
  type Output = Tenant;
  async fn compose(ctx: &Context<'_>) -> Result<Tenant> {
    let head = ctx.get::<RequestHead>()?;
    let id = head.header("x-tenant").unwrap_or("");
    TENANTS
      .iter()
      .find(|t| t.id == id)
      .cloned()
      .ok_or_else(|| HttpError::with_detail(StatusCode::BAD_REQUEST, "unknown tenant").into())
  }
}

struct Db;
impl Node for Db {
  type Output = TenantDb;
  async fn compose(ctx: &Context<'_>) -> Result<TenantDb> {
    let tenant = ctx.resolve::<CurrentTenant>().await?;
    Ok(TenantDb {
      tenant: (*tenant).clone(),
      projects: ctx.get::<Projects>()?,
    })
  }
}

fn project_json(p: &Project) -> Value {
  json!({ "id": p.id, "name": p.name })
}

async fn list_projects(Inject(db): Inject<Db>) -> Json<Value> {
  Json(Value::Array(db.projects().iter().map(project_json).collect()))
}

#[derive(Deserialize)]
struct NewProject {
  name: String,
}

async fn create_project(Inject(db): Inject<Db>, Json(body): Json<NewProject>) -> Json<Value> {
  Json(project_json(&db.create_project(body.name)))
}

async fn whoami(Inject(tenant): Inject<CurrentTenant>, Scoped(projects): Scoped<Projects>) -> Json<Value> {
  let total = projects.0.read().len();
  Json(json!({ "tenant": tenant.name, "projects_overall": total }))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .init();

  let scope = create_scope(None);
  scope.set(Projects(RwLock::new(vec![
    Project { id: 1, tenant_id: "acme", name: "Website".into() },
    Project { id: 2, tenant_id: "acme", name: "Mobile App".into() },
    Project { id: 3, tenant_id: "startup", name: "MVP".into() },
  ])));

  let layer = nodnod_route_in(scope.scope());
  let app = Router::new()
    .route("/projects", get(list_projects).post(create_project).layer(layer.clone()))
    .route("/whoami", get(whoami).layer(layer));

  let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
  tracing::info!("listening on {}", listener.local_addr()?);
  axum::serve(listener, app).await
}
