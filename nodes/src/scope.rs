//! The `Scope` tree and its per-type value store.

use crate::core::{downcast, SlotKey, Stored};
use crate::error::Result;
use crate::node::{Context, Node, NodeSet};
use dashmap::DashMap;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// A resolution context.
///
/// Scopes form a tree: a child references its parent, and lookups walk from
/// the child up to the root. Values composed for a node are cached in the
/// scope that asked for them, so a per-request child never writes into the
/// shared scope it was derived from.
///
/// `Scope` is a cheap handle; clones refer to the same underlying scope.
#[derive(Clone)]
pub struct Scope {
  inner: Arc<ScopeInner>,
}

struct ScopeInner {
  detail: String,
  parent: Option<Scope>,
  store: DashMap<SlotKey, Stored>,
  finalizers: Mutex<Finalizers>,
}

#[derive(Default)]
struct Finalizers {
  closed: bool,
  pending: Vec<BoxFuture<'static, ()>>,
}

impl Scope {
  /// Creates a new root scope.
  pub fn new(detail: impl Into<String>) -> Self {
    Self::with_parent(detail.into(), None)
  }

  /// Creates a child of this scope. The parent is left untouched.
  pub fn child(&self, detail: impl Into<String>) -> Self {
    Self::with_parent(detail.into(), Some(self.clone()))
  }

  fn with_parent(detail: String, parent: Option<Scope>) -> Self {
    Self {
      inner: Arc::new(ScopeInner {
        detail,
        parent,
        store: DashMap::new(),
        finalizers: Mutex::new(Finalizers::default()),
      }),
    }
  }

  pub fn detail(&self) -> &str {
    &self.inner.detail
  }

  pub fn parent(&self) -> Option<&Scope> {
    self.inner.parent.as_ref()
  }

  /// Number of ancestors above this scope. A root scope has depth 0.
  pub fn depth(&self) -> usize {
    self.ancestors().count() - 1
  }

  /// Returns `true` if both handles refer to the same scope.
  pub fn ptr_eq(&self, other: &Scope) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  fn ancestors(&self) -> impl Iterator<Item = &Scope> {
    std::iter::successors(Some(self), |scope| scope.parent())
  }

  // --- Store ---

  pub(crate) fn insert(&self, key: SlotKey, value: Stored) {
    self.inner.store.insert(key, value);
  }

  pub(crate) fn lookup_local(&self, key: &SlotKey) -> Option<Stored> {
    self.inner.store.get(key).map(|entry| entry.value().clone())
  }

  pub(crate) fn lookup(&self, key: &SlotKey) -> Option<Stored> {
    self.ancestors().find_map(|scope| scope.lookup_local(key))
  }

  /// Stores a plain value in this scope. Last write wins.
  pub fn push<T: Any + Send + Sync>(&self, value: T) {
    self.push_arc(Arc::new(value));
  }

  pub fn push_arc<T: Any + Send + Sync>(&self, value: Arc<T>) {
    self.insert(SlotKey::value::<T>(), value);
  }

  /// Stores an output for node `N` in this scope, bypassing its composition.
  pub fn push_node<N: Node>(&self, output: N::Output) {
    self.insert(SlotKey::node::<N>(), Arc::new(output));
  }

  /// Looks up a plain value on this scope and its ancestors.
  pub fn retrieve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.lookup(&SlotKey::value::<T>()).and_then(downcast)
  }

  /// Looks up a plain value on this scope only.
  pub fn retrieve_local<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.lookup_local(&SlotKey::value::<T>()).and_then(downcast)
  }

  /// Looks up an already composed output of `N` on this scope and its ancestors.
  pub fn retrieve_node<N: Node>(&self) -> Option<Arc<N::Output>> {
    self.lookup(&SlotKey::node::<N>()).and_then(downcast)
  }

  pub fn retrieve_node_local<N: Node>(&self) -> Option<Arc<N::Output>> {
    self.lookup_local(&SlotKey::node::<N>()).and_then(downcast)
  }

  pub fn contains<T: Any + Send + Sync>(&self) -> bool {
    self.lookup(&SlotKey::value::<T>()).is_some()
  }

  pub fn contains_node<N: Node>(&self) -> bool {
    self.lookup(&SlotKey::node::<N>()).is_some()
  }

  // --- Resolution ---

  /// Resolves node `N`, composing it and its dependencies as needed.
  pub async fn resolve<N: Node>(&self) -> Result<Arc<N::Output>> {
    Context::root(self).resolve::<N>().await
  }

  /// Resolves every node of a tuple, in order.
  ///
  /// ```
  /// use nodnod::{Context, Node, Result, Scope};
  ///
  /// struct A;
  /// impl Node for A {
  ///   type Output = u32;
  ///   async fn compose(_: &Context<'_>) -> Result<u32> {
  ///     Ok(1)
  ///   }
  /// }
  ///
  /// struct B;
  /// impl Node for B {
  ///   type Output = u32;
  ///   async fn compose(ctx: &Context<'_>) -> Result<u32> {
  ///     Ok(*ctx.resolve::<A>().await? + 1)
  ///   }
  /// }
  ///
  /// # #[tokio::main(flavor = "current_thread")]
  /// # async fn main() -> Result<()> {
  /// let scope = Scope::new("doc");
  /// let (a, b) = scope.resolve_all::<(A, B)>().await?;
  /// assert_eq!((*a, *b), (1, 2));
  /// # Ok(())
  /// # }
  /// ```
  pub async fn resolve_all<S: NodeSet>(&self) -> Result<S::Outputs> {
    debug!(scope = %self.inner.detail, nodes = ?S::type_names(), "resolving node set");
    S::resolve_in(&Context::root(self)).await
  }

  // --- Lifetime ---

  /// Registers a finalizer, run when this scope is closed.
  ///
  /// Finalizers run in reverse registration order. A finalizer registered on
  /// an already closed scope is dropped without running.
  pub fn on_close<F>(&self, finalizer: F)
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let mut finalizers = self.inner.finalizers.lock();
    if finalizers.closed {
      warn!(scope = %self.inner.detail, "finalizer registered on a closed scope was dropped");
      return;
    }
    finalizers.pending.push(Box::pin(finalizer));
  }

  pub fn pending_finalizers(&self) -> usize {
    self.inner.finalizers.lock().pending.len()
  }

  pub fn is_closed(&self) -> bool {
    self.inner.finalizers.lock().closed
  }

  /// Closes the scope, running its finalizers. Closing twice is a no-op.
  ///
  /// Values stay readable after close; only finalizers are affected.
  pub async fn close(&self) {
    let pending = {
      let mut finalizers = self.inner.finalizers.lock();
      if finalizers.closed {
        return;
      }
      finalizers.closed = true;
      std::mem::take(&mut finalizers.pending)
    };

    debug!(scope = %self.inner.detail, finalizers = pending.len(), "closing scope");
    for finalizer in pending.into_iter().rev() {
      finalizer.await;
    }
  }
}

impl Drop for ScopeInner {
  fn drop(&mut self) {
    let finalizers = self.finalizers.get_mut();
    if !finalizers.closed && !finalizers.pending.is_empty() {
      warn!(
        scope = %self.detail,
        finalizers = finalizers.pending.len(),
        "scope dropped without being closed; pending finalizers will not run"
      );
    }
  }
}

impl fmt::Debug for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Scope")
      .field("detail", &self.inner.detail)
      .field("depth", &self.depth())
      .field("entries", &self.inner.store.len())
      .finish()
  }
}
