//! The per-call scope slot carried in request extensions.

use crate::head::RequestHead;
use nodnod::Scope;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(1);

/// Holds what is needed to derive the scope of one call, and the scope once
/// it exists. The scope is only created when an extractor first asks for it.
#[derive(Clone)]
pub(crate) struct RequestScope {
  inner: Arc<SlotInner>,
}

struct SlotInner {
  base: Option<Scope>,
  head: RequestHead,
  detail_prefix: Arc<str>,
  scope: OnceCell<Scope>,
}

impl RequestScope {
  pub(crate) fn new(base: Option<Scope>, head: RequestHead, detail_prefix: Arc<str>) -> Self {
    Self {
      inner: Arc::new(SlotInner {
        base,
        head,
        detail_prefix,
        scope: OnceCell::new(),
      }),
    }
  }

  /// The scope of this call: a child of the base scope, or a fresh root.
  pub(crate) fn scope(&self) -> &Scope {
    self.inner.scope.get_or_init(|| {
      let detail = format!(
        "{}:{}",
        self.inner.detail_prefix,
        NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed)
      );
      let scope = match &self.inner.base {
        Some(base) => base.child(detail),
        None => Scope::new(detail),
      };
      scope.push(self.inner.head.clone());
      scope
    })
  }

  pub(crate) fn is_materialized(&self) -> bool {
    self.inner.scope.get().is_some()
  }

  /// Closes the call scope if it was ever created.
  pub(crate) async fn close(&self) {
    if let Some(scope) = self.inner.scope.get() {
      scope.close().await;
    }
  }
}
