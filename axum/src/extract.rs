//! Extractors resolving nodes and scoped values for a handler.

use crate::error::NodeRejection;
use crate::slot::RequestScope;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use nodnod::{ComposeError, Node, Scope};
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::error;

fn request_scope(parts: &Parts) -> Result<RequestScope, NodeRejection> {
  parts
    .extensions
    .get::<RequestScope>()
    .cloned()
    .ok_or_else(|| {
      error!(uri = %parts.uri, "node extractor used on a route without NodeRouteLayer");
      NodeRejection::MissingLayer
    })
}

/// Resolves node `N` in the scope of the current call.
///
/// Several extractors of one handler share that scope, so a node they have
/// in common is composed once per call.
pub struct Inject<N: Node>(pub Arc<N::Output>);

impl<N: Node> Inject<N> {
  pub fn into_inner(self) -> Arc<N::Output> {
    self.0
  }
}

impl<N: Node> Deref for Inject<N> {
  type Target = N::Output;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl<N: Node> Clone for Inject<N> {
  fn clone(&self) -> Self {
    Inject(self.0.clone())
  }
}

impl<N> fmt::Debug for Inject<N>
where
  N: Node,
  N::Output: fmt::Debug,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Inject").field(&self.0).finish()
  }
}

impl<N, S> FromRequestParts<S> for Inject<N>
where
  N: Node,
  S: Send + Sync,
{
  type Rejection = NodeRejection;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let slot = request_scope(parts)?;
    let output = slot.scope().resolve::<N>().await?;
    Ok(Inject(output))
  }
}

/// Reads a plain value, such as an application service put in the shared
/// scope with `NodeScope::set`, from the scope chain of the current call.
#[derive(Debug)]
pub struct Scoped<T>(pub Arc<T>);

impl<T> Deref for Scoped<T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl<T> Clone for Scoped<T> {
  fn clone(&self) -> Self {
    Scoped(self.0.clone())
  }
}

impl<T, S> FromRequestParts<S> for Scoped<T>
where
  T: Any + Send + Sync,
  S: Send + Sync,
{
  type Rejection = NodeRejection;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let slot = request_scope(parts)?;
    slot
      .scope()
      .retrieve::<T>()
      .map(Scoped)
      .ok_or_else(|| ComposeError::unresolved::<T>().into())
  }
}

/// The scope of the current call, for handlers that resolve nodes themselves.
#[derive(Clone, Debug)]
pub struct CallScope(pub Scope);

impl Deref for CallScope {
  type Target = Scope;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl<S> FromRequestParts<S> for CallScope
where
  S: Send + Sync,
{
  type Rejection = NodeRejection;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let slot = request_scope(parts)?;
    Ok(CallScope(slot.scope().clone()))
  }
}
