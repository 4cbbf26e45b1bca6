//! Resolution of deferred nodes against a context.

use anyhow::{bail, Result};
use futures::future::LocalBoxFuture;
use tracing::trace;

use crate::template::{Kind, Node, Phase, Template};


impl<C> Template<C> {
    /// Run all deferred nodes of the tree, strictly left to right and
    /// one at a time, each with `context`, and return the resolved
    /// tree. A template that is already resolved is returned as is,
    /// hence resolving the result again never calls anything.
    ///
    /// The first failing deferred function ends resolution with its
    /// error; the deferred nodes after it are not run.
    pub fn resolve<'a>(self, context: &'a mut C) -> LocalBoxFuture<'a, Result<Template<C>>>
    where C: 'a
    {
        Box::pin(async move {
            if self.resolved {
                return Ok(self)
            }
            let Template { kind, nodes, .. } = self;
            trace!("resolving {} template with {} nodes", kind.as_str(), nodes.len());
            let mut resolved = Vec::with_capacity(nodes.len());
            for node in nodes {
                resolved.push(resolve_node(kind, node, &mut *context).await?);
            }
            let t = Template::from_nodes(kind, resolved);
            if !t.resolved {
                bail!("BUG: {} template still unresolved after resolution", kind.as_str())
            }
            Ok(t)
        })
    }
}

fn resolve_node<'a, C>(
    parent: Kind,
    node: Node<C>,
    context: &'a mut C
) -> LocalBoxFuture<'a, Result<Node<C>>>
where C: 'a
{
    Box::pin(async move {
        match node {
            leaf @ (Node::Literal(_) | Node::Escaped(_)) => Ok(leaf),
            Node::Trusted(t) => {
                if t.resolved {
                    return Ok(Node::Trusted(t))
                }
                let t = t.resolve(context).await?;
                // Now that the text is known, an html child of a
                // json parent can become a string.
                Ok(Node::embed(parent, t))
            }
            Node::Group(nodes) => {
                let mut resolved = Vec::with_capacity(nodes.len());
                for node in nodes {
                    resolved.push(resolve_node(parent, node, &mut *context).await?);
                }
                Ok(Node::Group(resolved))
            }
            Node::Deferred(d) => {
                let value = d.call(&mut *context).await?;
                let node = Node::from_value(parent, value, Phase::Resolution);
                resolve_node(parent, node, context).await
            }
        }
    })
}
