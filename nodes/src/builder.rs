//! A named façade over a root scope, for values shared by every request.

use crate::node::Node;
use crate::scope::Scope;
use std::any::Any;
use std::sync::Arc;

const DEFAULT_NAME: &str = "app";

/// Typed get/set access to a root [`Scope`].
///
/// Values set here are visible to every child of [`NodeScope::scope`], which
/// makes it the place for application-wide services and configuration.
#[derive(Clone, Debug)]
pub struct NodeScope {
  scope: Scope,
}

impl NodeScope {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      scope: Scope::new(name),
    }
  }

  pub fn name(&self) -> &str {
    self.scope.detail()
  }

  /// The underlying scope, to be used as the parent of per-request scopes.
  pub fn scope(&self) -> &Scope {
    &self.scope
  }

  pub fn into_scope(self) -> Scope {
    self.scope
  }

  /// Stores `value` under its type. Last write wins.
  pub fn set<T: Any + Send + Sync>(&self, value: T) {
    self.scope.push(value);
  }

  /// Stores `output` as the value of node `N`; `N` is then never composed
  /// for scopes under this one.
  pub fn set_node<N: Node>(&self, output: N::Output) {
    self.scope.push_node::<N>(output);
  }

  /// Reads the value stored under `T`, if any.
  pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.scope.retrieve_local::<T>()
  }

  pub fn get_node<N: Node>(&self) -> Option<Arc<N::Output>> {
    self.scope.retrieve_node_local::<N>()
  }
}

impl Default for NodeScope {
  fn default() -> Self {
    Self::new(DEFAULT_NAME)
  }
}

/// Creates a shared scope, named `"app"` unless a name is given.
///
/// ```
/// use nodnod::create_scope;
///
/// struct Config {
///   database_url: String,
/// }
///
/// let app = create_scope(None);
/// assert!(app.get::<Config>().is_none());
///
/// app.set(Config { database_url: "postgres://localhost/app".into() });
/// assert_eq!(app.get::<Config>().unwrap().database_url, "postgres://localhost/app");
/// ```
pub fn create_scope(name: Option<&str>) -> NodeScope {
  NodeScope::new(name.unwrap_or(DEFAULT_NAME))
}
