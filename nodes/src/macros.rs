//! `NodeSet` implementations for tuples of nodes.

use crate::error::Result;
use crate::node::{Context, Node, NodeSet};
use std::sync::Arc;

macro_rules! impl_node_set {
    ($($node:ident),+) => {
        impl<$($node: Node),+> NodeSet for ($($node,)+) {
            type Outputs = ($(Arc<<$node as Node>::Output>,)+);

            async fn resolve_in(ctx: &Context<'_>) -> Result<Self::Outputs> {
                Ok(($(ctx.resolve::<$node>().await?,)+))
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$node>()),+]
            }
        }
    };
}

impl_node_set!(A);
impl_node_set!(A, B);
impl_node_set!(A, B, C);
impl_node_set!(A, B, C, D);
impl_node_set!(A, B, C, D, E);
impl_node_set!(A, B, C, D, E, F);
impl_node_set!(A, B, C, D, E, F, G);
impl_node_set!(A, B, C, D, E, F, G, H);
