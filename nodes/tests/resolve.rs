use nodnod::{create_scope, ComposeError, Context, Node, NodeSet, Result, Scope};
use pretty_assertions::assert_eq;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

struct Ten;
impl Node for Ten {
  type Output = i64;
  async fn compose(_: &Context<'_>) -> Result<i64> {
    Ok(10)
  }
}

struct Doubled;
impl Node for Doubled {
  type Output = i64;
  async fn compose(ctx: &Context<'_>) -> Result<i64> {
    Ok(*ctx.resolve::<Ten>().await? * 2)
  }
}

#[derive(Debug)]
struct Forbidden;

impl fmt::Display for Forbidden {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("forbidden")
  }
}

impl std::error::Error for Forbidden {}

// --- Resolution Tests ---

#[tokio::test]
async fn test_node_chain() {
  // Arrange
  let scope = Scope::new("req");

  // Act
  let doubled = scope.resolve::<Doubled>().await.unwrap();

  // Assert
  assert_eq!(*doubled, 20);
  // The dependency was cached along the way.
  assert_eq!(*scope.retrieve_node_local::<Ten>().unwrap(), 10);
}

#[tokio::test]
async fn test_composition_runs_once_per_fresh_scope() {
  // Arrange
  static CALLS: AtomicUsize = AtomicUsize::new(0);
  struct Counted;
  impl Node for Counted {
    type Output = usize;
    async fn compose(_: &Context<'_>) -> Result<usize> {
      Ok(CALLS.fetch_add(1, Ordering::SeqCst) + 1)
    }
  }

  // Act & Assert
  for expected in 1..=3 {
    let scope = Scope::new("req");
    assert_eq!(*scope.resolve::<Counted>().await.unwrap(), expected);
    // A second resolution in the same scope is served from its cache.
    assert_eq!(*scope.resolve::<Counted>().await.unwrap(), expected);
  }
  assert_eq!(CALLS.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_preset_node_on_shared_scope_skips_composition() {
  // Arrange
  static CALLS: AtomicUsize = AtomicUsize::new(0);
  struct Expensive;
  impl Node for Expensive {
    type Output = String;
    async fn compose(_: &Context<'_>) -> Result<String> {
      CALLS.fetch_add(1, Ordering::SeqCst);
      Ok("composed".into())
    }
  }

  let app = create_scope(None);
  app.set_node::<Expensive>("preset".into());

  // Act
  for i in 0..5 {
    let request = app.scope().child(format!("req:{}", i));
    assert_eq!(*request.resolve::<Expensive>().await.unwrap(), "preset");
    request.close().await;
  }

  // Assert
  assert_eq!(CALLS.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_outputs_are_cached_in_the_requesting_child_only() {
  // Arrange
  let app = Scope::new("app");
  let request = app.child("req");

  // Act
  request.resolve::<Ten>().await.unwrap();

  // Assert
  assert!(request.contains_node::<Ten>());
  assert!(!app.contains_node::<Ten>());
  assert!(app.child("other").retrieve_node::<Ten>().is_none());
}

#[tokio::test]
async fn test_compose_reads_plain_values_from_ancestors() {
  // Arrange
  struct Config {
    factor: i64,
  }
  struct Scaled;
  impl Node for Scaled {
    type Output = i64;
    async fn compose(ctx: &Context<'_>) -> Result<i64> {
      let config = ctx.get::<Config>()?;
      Ok(*ctx.resolve::<Ten>().await? * config.factor)
    }
  }

  let app = create_scope(None);
  app.set(Config { factor: 3 });
  let request = app.scope().child("req");

  // Act
  let scaled = request.resolve::<Scaled>().await.unwrap();

  // Assert
  assert_eq!(*scaled, 30);
}

#[tokio::test]
async fn test_missing_value_is_unresolved() {
  // Arrange
  struct Missing;
  struct NeedsMissing;
  impl Node for NeedsMissing {
    type Output = ();
    async fn compose(ctx: &Context<'_>) -> Result<()> {
      ctx.get::<Missing>()?;
      Ok(())
    }
  }

  // Act
  let err = Scope::new("req").resolve::<NeedsMissing>().await.unwrap_err();

  // Assert
  assert!(err.is_unresolved());
  assert!(err.to_string().contains("Missing"));
}

// --- Error Propagation Tests ---

#[tokio::test]
async fn test_failure_propagates_unchanged_through_dependents() {
  // Arrange
  static ADMIN_RAN: AtomicUsize = AtomicUsize::new(0);
  struct CurrentUser;
  impl Node for CurrentUser {
    type Output = String;
    async fn compose(_: &Context<'_>) -> Result<String> {
      Err(ComposeError::failed::<Self>(Forbidden))
    }
  }
  struct RequireAdmin;
  impl Node for RequireAdmin {
    type Output = ();
    async fn compose(ctx: &Context<'_>) -> Result<()> {
      let _user = ctx.resolve::<CurrentUser>().await?;
      ADMIN_RAN.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  }

  // Act
  let scope = Scope::new("req");
  let err = scope.resolve::<RequireAdmin>().await.unwrap_err();

  // Assert
  match &err {
    ComposeError::Failed { node, .. } => assert!(node.ends_with("CurrentUser")),
    other => panic!("unexpected error: {:?}", other),
  }
  assert!(err.source_as::<Forbidden>().is_some());
  assert_eq!(ADMIN_RAN.load(Ordering::SeqCst), 0);
  assert!(!scope.contains_node::<CurrentUser>());
  assert!(!scope.contains_node::<RequireAdmin>());
}

#[tokio::test]
async fn test_cycle_is_reported() {
  // Arrange
  struct Ping;
  struct Pong;
  impl Node for Ping {
    type Output = ();
    async fn compose(ctx: &Context<'_>) -> Result<()> {
      ctx.resolve::<Pong>().await?;
      Ok(())
    }
  }
  impl Node for Pong {
    type Output = ();
    async fn compose(ctx: &Context<'_>) -> Result<()> {
      ctx.resolve::<Ping>().await?;
      Ok(())
    }
  }

  // Act
  let err = Scope::new("req").resolve::<Ping>().await.unwrap_err();

  // Assert
  match err {
    ComposeError::Cycle { path } => {
      assert_eq!(path.len(), 3);
      assert!(path[0].ends_with("Ping"));
      assert!(path[1].ends_with("Pong"));
      assert!(path[2].ends_with("Ping"));
    }
    other => panic!("expected a cycle, got {:?}", other),
  }
}

#[tokio::test]
async fn test_diamond_is_not_a_cycle() {
  // Arrange
  struct Left;
  struct Right;
  struct Top;
  impl Node for Left {
    type Output = i64;
    async fn compose(ctx: &Context<'_>) -> Result<i64> {
      Ok(*ctx.resolve::<Ten>().await? + 1)
    }
  }
  impl Node for Right {
    type Output = i64;
    async fn compose(ctx: &Context<'_>) -> Result<i64> {
      Ok(*ctx.resolve::<Ten>().await? + 2)
    }
  }
  impl Node for Top {
    type Output = i64;
    async fn compose(ctx: &Context<'_>) -> Result<i64> {
      Ok(*ctx.resolve::<Left>().await? + *ctx.resolve::<Right>().await?)
    }
  }

  // Act
  let top = Scope::new("req").resolve::<Top>().await.unwrap();

  // Assert
  assert_eq!(*top, 23);
}

#[tokio::test]
async fn test_path_is_visible_to_compositions() {
  // Arrange
  struct Inner;
  struct Outer;
  impl Node for Inner {
    type Output = Vec<&'static str>;
    async fn compose(ctx: &Context<'_>) -> Result<Vec<&'static str>> {
      Ok(ctx.path())
    }
  }
  impl Node for Outer {
    type Output = Vec<&'static str>;
    async fn compose(ctx: &Context<'_>) -> Result<Vec<&'static str>> {
      Ok((*ctx.resolve::<Inner>().await?).clone())
    }
  }

  // Act
  let path = Scope::new("req").resolve::<Outer>().await.unwrap();

  // Assert
  assert_eq!(path.len(), 2);
  assert!(path[0].ends_with("Outer"));
  assert!(path[1].ends_with("Inner"));
}

// --- Node Set Tests ---

#[tokio::test]
async fn test_resolve_all_returns_outputs_in_order() {
  // Arrange
  let scope = Scope::new("req");

  // Act
  let (ten, doubled) = scope.resolve_all::<(Ten, Doubled)>().await.unwrap();
  let names = <(Ten, Doubled)>::type_names();

  // Assert
  assert_eq!((*ten, *doubled), (10, 20));
  assert_eq!(names.len(), 2);
  assert!(names[0].ends_with("Ten"));
  assert!(names[1].ends_with("Doubled"));
}

// --- Finalizer Tests ---

#[tokio::test]
async fn test_composition_cleanup_runs_on_close() {
  // Arrange
  static CLEANED: AtomicUsize = AtomicUsize::new(0);
  struct Resource;
  impl Node for Resource {
    type Output = &'static str;
    async fn compose(ctx: &Context<'_>) -> Result<&'static str> {
      ctx.on_close(async {
        CLEANED.fetch_add(1, Ordering::SeqCst);
      });
      Ok("res")
    }
  }

  let scope = Scope::new("req");

  // Act
  assert_eq!(*scope.resolve::<Resource>().await.unwrap(), "res");
  assert_eq!(CLEANED.load(Ordering::SeqCst), 0);
  scope.close().await;

  // Assert
  assert_eq!(CLEANED.load(Ordering::SeqCst), 1);
}

// --- Concurrency Tests ---

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_a_base_scope_without_interference() {
  // Arrange
  struct RequestId(usize);
  struct Echo;
  impl Node for Echo {
    type Output = usize;
    async fn compose(ctx: &Context<'_>) -> Result<usize> {
      tokio::task::yield_now().await;
      Ok(ctx.get::<RequestId>()?.0)
    }
  }

  let app = Arc::new(create_scope(None));

  // Act
  let handles: Vec<_> = (0..32)
    .map(|id| {
      let app = app.clone();
      tokio::spawn(async move {
        let request = app.scope().child(format!("req:{}", id));
        request.push(RequestId(id));
        let echoed = *request.resolve::<Echo>().await.unwrap();
        request.close().await;
        (id, echoed)
      })
    })
    .collect();

  // Assert
  for handle in handles {
    let (id, echoed) = handle.await.unwrap();
    assert_eq!(id, echoed);
  }
  assert!(!app.scope().contains_node::<Echo>());
}
