//! # nodnod_axum
//!
//! Resolve [`nodnod`] nodes as arguments of axum handlers.
//!
//! A route opts in with the [`nodnod_route`] layer. For every call, the layer
//! derives a scope (a child of the shared scope given to [`nodnod_route_in`],
//! or a fresh root scope), and the [`Inject`] extractor resolves the requested
//! node in it. Any other handler argument is an ordinary axum extractor, so
//! path, query and body parsing stay with axum.
//!
//! - Compositions read the request through [`RequestHead`], which every call
//!   scope carries.
//! - A composition that fails aborts the call before the handler runs; the
//!   error reaches axum as a [`NodeRejection`]. An [`HttpError`] inside it
//!   becomes the response status.
//! - After the handler returns, the call scope is closed and the finalizers
//!   registered by compositions run.
//!
//! ## Example
//!
//! ```
//! use axum::{http::StatusCode, routing::get, Router};
//! use nodnod::{create_scope, Context, Node, Result};
//! use nodnod_axum::{nodnod_route_in, HttpError, Inject, RequestHead, Scoped};
//!
//! struct Greeting(String);
//!
//! struct CurrentUser;
//! impl Node for CurrentUser {
//!   type Output = String;
//!   async fn compose(ctx: &Context<'_>) -> Result<String> {
//!     let head = ctx.get::<RequestHead>()?;
//!     head
//!       .header("x-user")
//!       .map(str::to_owned)
//!       .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED).into())
//!   }
//! }
//!
//! async fn me(Inject(user): Inject<CurrentUser>, Scoped(greeting): Scoped<Greeting>) -> String {
//!   format!("{} {}", greeting.0, user)
//! }
//!
//! let app_scope = create_scope(None);
//! app_scope.set(Greeting("hello".into()));
//!
//! let app: Router = Router::new().route("/me", get(me).layer(nodnod_route_in(app_scope.scope())));
//! ```

mod error;
mod extract;
mod head;
mod layer;
mod slot;

pub use error::{HttpError, NodeRejection};
pub use extract::{CallScope, Inject, Scoped};
pub use head::RequestHead;
pub use layer::{nodnod_route, nodnod_route_in, NodeRouteLayer, NodeRouteService};
