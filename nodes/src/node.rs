//! Nodes and the context their compositions run in.

use crate::core::{downcast, ResolutionPath, SlotKey};
use crate::error::{ComposeError, Result};
use crate::scope::Scope;
use futures_util::future::BoxFuture;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, trace};

/// A unit of composable, typed data or behavior.
///
/// The implementing type is only a marker: it identifies the node, while
/// `Output` is what the node produces. Dependencies are declared by resolving
/// them through the [`Context`] inside `compose`.
///
/// ```
/// use nodnod::{Context, Node, Result, Scope};
///
/// struct Greeting;
/// impl Node for Greeting {
///   type Output = String;
///   async fn compose(ctx: &Context<'_>) -> Result<String> {
///     let name = ctx.get::<&'static str>()?;
///     Ok(format!("hello {}", name))
///   }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let scope = Scope::new("app");
/// scope.push("world");
/// assert_eq!(*scope.resolve::<Greeting>().await?, "hello world");
/// # Ok(())
/// # }
/// ```
pub trait Node: Send + Sync + 'static {
  type Output: Send + Sync + 'static;

  fn compose(ctx: &Context<'_>) -> impl Future<Output = Result<Self::Output>> + Send;
}

/// A tuple of nodes resolved together, see [`Scope::resolve_all`].
pub trait NodeSet: 'static {
  type Outputs: Send;

  fn resolve_in(ctx: &Context<'_>) -> impl Future<Output = Result<Self::Outputs>> + Send;

  fn type_names() -> Vec<&'static str>;
}

/// Handle given to a node's composition.
///
/// Resolutions made through a context are cached in the scope it belongs to,
/// and remember the chain of nodes that led to them.
pub struct Context<'a> {
  scope: &'a Scope,
  path: ResolutionPath,
}

impl<'a> Context<'a> {
  pub(crate) fn root(scope: &'a Scope) -> Self {
    Self {
      scope,
      path: ResolutionPath::default(),
    }
  }

  /// The scope resolutions are cached in.
  pub fn scope(&self) -> &'a Scope {
    self.scope
  }

  /// Names of the nodes being composed, outermost first.
  pub fn path(&self) -> Vec<&'static str> {
    self.path.names()
  }

  /// Resolves node `N`.
  ///
  /// An output already present on the scope chain is returned as is.
  /// Otherwise `N` is composed and its output cached in this context's scope.
  /// Errors are returned unchanged and nothing is cached for them.
  pub async fn resolve<N: Node>(&self) -> Result<Arc<N::Output>> {
    let key = SlotKey::node::<N>();
    if self.path.contains(&key) {
      return Err(ComposeError::Cycle {
        path: self.path.extended(key).names(),
      });
    }

    if let Some(output) = self.scope.lookup(&key).and_then(downcast::<N::Output>) {
      trace!(node = key.type_name, scope = %self.scope.detail(), "node found on scope chain");
      return Ok(output);
    }

    let nested = Context {
      scope: self.scope,
      path: self.path.extended(key),
    };
    debug!(node = key.type_name, scope = %self.scope.detail(), "composing node");

    // Boxed so that node graphs of any depth have a finitely sized future.
    let composition: BoxFuture<'_, Result<N::Output>> = Box::pin(N::compose(&nested));
    match composition.await {
      Ok(output) => {
        let output = Arc::new(output);
        self.scope.insert(key, output.clone());
        Ok(output)
      }
      Err(err) => {
        debug!(node = key.type_name, scope = %self.scope.detail(), error = %err, "composition failed");
        Err(err)
      }
    }
  }

  /// Returns a required plain value from the scope chain.
  pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self
      .scope
      .retrieve::<T>()
      .ok_or_else(ComposeError::unresolved::<T>)
  }

  pub fn try_get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.scope.retrieve::<T>()
  }

  /// Registers teardown for whatever the current composition acquired.
  /// It runs when the scope closes, see [`Scope::on_close`].
  pub fn on_close<F>(&self, finalizer: F)
  where
    F: Future<Output = ()> + Send + 'static,
  {
    self.scope.on_close(finalizer);
  }
}
