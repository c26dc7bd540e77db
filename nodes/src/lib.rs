//! # nodnod
//!
//! Typed, composable nodes resolved through a tree of scopes.
//!
//! ## Core Concepts
//!
//! - **Node**: a marker type implementing [`Node`]. Its async `compose`
//!   produces the node's `Output` and declares dependencies by resolving other
//!   nodes, or reading plain values, through the [`Context`] it receives.
//! - **Scope**: a resolution context. Scopes form a tree; lookups walk from a
//!   child up to the root, and composed outputs are cached in the scope that
//!   requested them. A typical application keeps one shared scope and derives a
//!   short-lived child for every request.
//! - **Finalizers**: compositions register async teardown with
//!   [`Context::on_close`]; it runs, newest first, when the scope is closed.
//! - **NodeScope**: a named façade over a root scope with typed `set`/`get`,
//!   created with [`create_scope`].
//!
//! ## Quick Start
//!
//! ```
//! use nodnod::{create_scope, Context, Node, Result};
//!
//! struct Settings {
//!   greeting: String,
//! }
//!
//! struct Greeting;
//! impl Node for Greeting {
//!   type Output = String;
//!   async fn compose(ctx: &Context<'_>) -> Result<String> {
//!     let settings = ctx.get::<Settings>()?;
//!     Ok(format!("{}, world", settings.greeting))
//!   }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let app = create_scope(None);
//! app.set(Settings { greeting: "hello".into() });
//!
//! let request = app.scope().child("req:1");
//! assert_eq!(*request.resolve::<Greeting>().await?, "hello, world");
//! request.close().await;
//! # Ok(())
//! # }
//! ```

mod builder;
mod core;
mod error;
mod macros;
mod node;
mod scope;

pub use builder::{create_scope, NodeScope};
pub use error::{BoxError, ComposeError, Result};
pub use node::{Context, Node, NodeSet};
pub use scope::Scope;
