//! The route layer that gives every call its own node scope.

use crate::head::RequestHead;
use crate::slot::RequestScope;
use axum::http::Request;
use futures_util::future::BoxFuture;
use nodnod::Scope;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tower::{Layer, Service};
use tracing::{debug, trace, warn};

const DEFAULT_DETAIL_PREFIX: &str = "req";

/// Enables node injection on a route, with a fresh root scope per call.
///
/// ```
/// use axum::{routing::get, Router};
/// use nodnod::{Context, Node, Result};
/// use nodnod_axum::{nodnod_route, Inject, RequestHead};
///
/// struct Path;
/// impl Node for Path {
///   type Output = String;
///   async fn compose(ctx: &Context<'_>) -> Result<String> {
///     Ok(ctx.get::<RequestHead>()?.path().to_owned())
///   }
/// }
///
/// async fn handler(Inject(path): Inject<Path>) -> String {
///   (*path).clone()
/// }
///
/// let app: Router = Router::new().route("/", get(handler).layer(nodnod_route()));
/// ```
pub fn nodnod_route() -> NodeRouteLayer {
  NodeRouteLayer::new()
}

/// Enables node injection on a route, deriving each call's scope from `scope`.
pub fn nodnod_route_in(scope: &Scope) -> NodeRouteLayer {
  NodeRouteLayer::with_scope(scope.clone())
}

/// `tower` layer creating the per-call scope that node extractors resolve in.
///
/// The scope is created on first use, so routes whose handlers request no
/// node pay nothing. After the handler returns, the scope is closed and the
/// finalizers registered by compositions run; the response is passed through
/// untouched.
#[derive(Clone, Debug)]
pub struct NodeRouteLayer {
  base: Option<Scope>,
  detail_prefix: Arc<str>,
}

impl NodeRouteLayer {
  pub fn new() -> Self {
    Self {
      base: None,
      detail_prefix: Arc::from(DEFAULT_DETAIL_PREFIX),
    }
  }

  /// Per-call scopes become children of `scope`.
  pub fn with_scope(scope: Scope) -> Self {
    Self::new().scope(scope)
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.base = Some(scope);
    self
  }

  /// Prefix of per-call scope details, `req` by default.
  pub fn detail_prefix(mut self, prefix: impl AsRef<str>) -> Self {
    self.detail_prefix = Arc::from(prefix.as_ref());
    self
  }

  pub fn base_scope(&self) -> Option<&Scope> {
    self.base.as_ref()
  }
}

impl Default for NodeRouteLayer {
  fn default() -> Self {
    Self::new()
  }
}

impl<S> Layer<S> for NodeRouteLayer {
  type Service = NodeRouteService<S>;

  fn layer(&self, inner: S) -> Self::Service {
    NodeRouteService {
      inner,
      base: self.base.clone(),
      detail_prefix: self.detail_prefix.clone(),
    }
  }
}

/// Service produced by [`NodeRouteLayer`].
#[derive(Clone, Debug)]
pub struct NodeRouteService<S> {
  inner: S,
  base: Option<Scope>,
  detail_prefix: Arc<str>,
}

impl<S, B> Service<Request<B>> for NodeRouteService<S>
where
  S: Service<Request<B>> + Clone + Send + 'static,
  S::Future: Send + 'static,
  S::Response: Send + 'static,
  S::Error: Send + 'static,
  B: Send + 'static,
{
  type Response = S::Response;
  type Error = S::Error;
  type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

  fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
    self.inner.poll_ready(cx)
  }

  fn call(&mut self, mut req: Request<B>) -> Self::Future {
    let slot = RequestScope::new(
      self.base.clone(),
      RequestHead::from_request(&req),
      self.detail_prefix.clone(),
    );
    req.extensions_mut().insert(slot.clone());

    // Call the instance that was driven to readiness, keep a fresh clone.
    let clone = self.inner.clone();
    let mut inner = std::mem::replace(&mut self.inner, clone);

    let guard = CloseGuard(Some(slot));
    Box::pin(async move {
      let response = inner.call(req).await;
      guard.close().await;
      response
    })
  }
}

/// Closes the call scope once the handler is done, or, if the call is
/// dropped before that, on a task spawned on the current runtime.
struct CloseGuard(Option<RequestScope>);

impl CloseGuard {
  async fn close(mut self) {
    if let Some(slot) = self.0.take() {
      if slot.is_materialized() {
        trace!(scope = %slot.scope().detail(), "handler returned; closing call scope");
      }
      slot.close().await;
    }
  }
}

impl Drop for CloseGuard {
  fn drop(&mut self) {
    let Some(slot) = self.0.take() else {
      return;
    };
    if !slot.is_materialized() {
      return;
    }

    let detail = slot.scope().detail().to_owned();
    match Handle::try_current() {
      Ok(handle) => {
        debug!(scope = %detail, "call dropped before completion; closing call scope in the background");
        handle.spawn(async move { slot.close().await });
      }
      Err(_) => {
        warn!(scope = %detail, "call dropped outside of a tokio runtime; finalizers will not run");
      }
    }
  }
}
