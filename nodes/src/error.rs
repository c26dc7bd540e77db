use std::error::Error as StdError;

use thiserror::Error;

/// A boxed, thread-safe error raised by a composition.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised while resolving nodes.
#[derive(Debug, Error)]
pub enum ComposeError {
  /// A required value was not found anywhere on the scope chain.
  #[error("unresolved dependency: {type_name}")]
  Unresolved { type_name: &'static str },

  /// A node depends on itself, directly or through other nodes.
  #[error("dependency cycle: {}", .path.join(" -> "))]
  Cycle { path: Vec<&'static str> },

  /// A composition returned an error.
  #[error("composition of {node} failed: {source}")]
  Failed {
    node: &'static str,
    #[source]
    source: BoxError,
  },

  /// An error raised outside of any particular node.
  #[error(transparent)]
  Custom(BoxError),
}

impl ComposeError {
  /// Wraps `err` as the failure of node `N`.
  pub fn failed<N: ?Sized + 'static>(err: impl Into<BoxError>) -> Self {
    ComposeError::Failed {
      node: std::any::type_name::<N>(),
      source: err.into(),
    }
  }

  /// Wraps an arbitrary error.
  pub fn custom(err: impl Into<BoxError>) -> Self {
    ComposeError::Custom(err.into())
  }

  /// The error for a required value of type `T` missing from the scope chain.
  pub fn unresolved<T: ?Sized + 'static>() -> Self {
    ComposeError::Unresolved {
      type_name: std::any::type_name::<T>(),
    }
  }

  pub fn is_unresolved(&self) -> bool {
    matches!(self, ComposeError::Unresolved { .. })
  }

  pub fn is_cycle(&self) -> bool {
    matches!(self, ComposeError::Cycle { .. })
  }

  /// Returns the user error carried by `Failed` or `Custom`, if it is an `E`.
  pub fn source_as<E: StdError + 'static>(&self) -> Option<&E> {
    match self {
      ComposeError::Failed { source, .. } | ComposeError::Custom(source) => {
        source.downcast_ref::<E>()
      }
      _ => None,
    }
  }
}

/// A specialized `Result` type for node resolution.
pub type Result<T, E = ComposeError> = std::result::Result<T, E>;
