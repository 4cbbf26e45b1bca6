//! Flattening of template trees into a linear leaf sequence, and
//! streaming of the leaves.

use std::io::Read;
use std::iter::FusedIterator;

use kstring::KString;

use crate::template::{Kind, Node, Template};


/// Depth for `Template::flat` that flattens completely.
pub const UNBOUNDED: usize = usize::MAX;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot stream a {kind} template that still contains deferred content")]
pub struct UnresolvedTemplate {
    pub kind: Kind,
}

fn push_flat<C>(parent: Kind, node: Node<C>, depth: usize, out: &mut Vec<Node<C>>) {
    if depth == 0 {
        out.push(node);
        return;
    }
    match node {
        Node::Group(nodes) => for node in nodes {
            push_flat(parent, node, depth - 1, out)
        },
        // An unresolved child of another kind has to stay a unit: its
        // deferred results are escaped for its own kind.
        Node::Trusted(t) if t.resolved || t.kind == parent => for node in t.nodes {
            push_flat(parent, node, depth - 1, out)
        },
        other => out.push(other),
    }
}

fn push_text<C>(nodes: &[Node<C>], out: &mut String) {
    for node in nodes {
        match node {
            Node::Literal(s) | Node::Escaped(s) => out.push_str(s),
            Node::Trusted(t) => push_text(&t.nodes, out),
            Node::Group(nodes) => push_text(nodes, out),
            Node::Deferred(_) => (),
        }
    }
}

impl<C> Template<C> {
    /// Splice groups and nested templates into this one, `depth`
    /// levels deep (`UNBOUNDED` for all), keeping the order of the
    /// leaves and the resolved flag.
    pub fn flat(self, depth: usize) -> Template<C> {
        let Template { kind, nodes, resolved } = self;
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            push_flat(kind, node, depth, &mut out);
        }
        Template { kind, nodes: out, resolved }
    }

    /// The output of a resolved template as a sequence of text
    /// chunks, one per non-empty leaf.
    pub fn into_chunks(self) -> Result<Chunks, UnresolvedTemplate> {
        if !self.resolved {
            return Err(UnresolvedTemplate { kind: self.kind })
        }
        let chunks: Vec<KString> = self.flat(UNBOUNDED).nodes.into_iter()
            .filter_map(|node| match node {
                Node::Literal(s) | Node::Escaped(s) if !s.is_empty() => Some(s),
                _ => None
            })
            .collect();
        Ok(Chunks { chunks: chunks.into_iter() })
    }

    /// The output of a resolved template as one string.
    pub fn render(self) -> Result<String, UnresolvedTemplate> {
        let mut out = String::new();
        for chunk in self.into_chunks()? {
            out.push_str(&chunk);
        }
        Ok(out)
    }

    /// Text of the leaves reachable without resolution; only called
    /// on resolved templates.
    pub(crate) fn into_text(self) -> String {
        let mut out = String::new();
        push_text(&self.nodes, &mut out);
        out
    }
}


/// Single-pass iterator over the output chunks of a resolved
/// template.
#[derive(Debug)]
pub struct Chunks {
    chunks: std::vec::IntoIter<KString>,
}

impl Iterator for Chunks {
    type Item = KString;

    fn next(&mut self) -> Option<KString> {
        self.chunks.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Chunks {}

impl FusedIterator for Chunks {}

impl Chunks {
    pub fn into_reader(self) -> ChunkReader {
        ChunkReader { chunks: self, current: KString::new(), pos: 0 }
    }
}

/// Reads the chunks one after the other, for use as a streamed
/// response body.
#[derive(Debug)]
pub struct ChunkReader {
    chunks: Chunks,
    current: KString,
    pos: usize,
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0)
        }
        while self.pos == self.current.len() {
            match self.chunks.next() {
                Some(chunk) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                None => return Ok(0)
            }
        }
        let rest = &self.current.as_bytes()[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}
