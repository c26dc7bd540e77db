//! Core, non-public data structures shared by scopes and resolution.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// What a slot in a scope's store holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum SlotKind {
  /// A plain value pushed into the scope.
  Value,
  /// The output of a node type.
  Node,
}

/// Key of a scope's store.
///
/// Equality and hashing only look at the `TypeId` and the kind; the type name
/// is carried along for logs and error messages.
#[derive(Clone, Copy)]
pub(crate) struct SlotKey {
  pub(crate) type_id: TypeId,
  pub(crate) kind: SlotKind,
  pub(crate) type_name: &'static str,
}

impl SlotKey {
  pub(crate) fn value<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      kind: SlotKind::Value,
      type_name: std::any::type_name::<T>(),
    }
  }

  pub(crate) fn node<N: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<N>(),
      kind: SlotKind::Node,
      type_name: std::any::type_name::<N>(),
    }
  }
}

impl PartialEq for SlotKey {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id && self.kind == other.kind
  }
}

impl Eq for SlotKey {}

impl Hash for SlotKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
    self.kind.hash(state);
  }
}

impl fmt::Debug for SlotKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      SlotKind::Value => write!(f, "Value({})", self.type_name),
      SlotKind::Node => write!(f, "Node({})", self.type_name),
    }
  }
}

/// A type-erased entry of a scope's store. Always an `Arc<T>` for the `T`
/// recorded in the slot key.
pub(crate) type Stored = Arc<dyn Any + Send + Sync>;

pub(crate) fn downcast<T: Any + Send + Sync>(stored: Stored) -> Option<Arc<T>> {
  stored.downcast::<T>().ok()
}

/// The chain of nodes currently being composed by one resolution.
///
/// Each nested `resolve` gets its own extended copy, so concurrent branches
/// of the same graph never see each other's entries. A node that shows up
/// twice on one chain is a dependency cycle.
#[derive(Clone, Default)]
pub(crate) struct ResolutionPath {
  keys: Vec<SlotKey>,
}

impl ResolutionPath {
  pub(crate) fn contains(&self, key: &SlotKey) -> bool {
    self.keys.iter().any(|k| k == key)
  }

  pub(crate) fn extended(&self, key: SlotKey) -> Self {
    let mut keys = Vec::with_capacity(self.keys.len() + 1);
    keys.extend_from_slice(&self.keys);
    keys.push(key);
    Self { keys }
  }

  pub(crate) fn names(&self) -> Vec<&'static str> {
    self.keys.iter().map(|k| k.type_name).collect()
  }
}

impl fmt::Debug for ResolutionPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.names()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  struct Marker;

  #[test]
  fn value_and_node_slots_do_not_collide() {
    let mut set = HashSet::new();
    assert!(set.insert(SlotKey::value::<Marker>()));
    assert!(set.insert(SlotKey::node::<Marker>()));
    assert!(!set.insert(SlotKey::value::<Marker>()));
  }

  #[test]
  fn path_extension_leaves_the_original_untouched() {
    let root = ResolutionPath::default();
    let one = root.extended(SlotKey::node::<Marker>());
    assert!(!root.contains(&SlotKey::node::<Marker>()));
    assert!(one.contains(&SlotKey::node::<Marker>()));
    assert_eq!(one.names().len(), 1);
  }
}
