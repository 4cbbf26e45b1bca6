//! The template tree: literal parts, escaped values, nested
//! templates and deferred nodes, tagged with the output syntax
//! ("kind") that decides how values are escaped.

use std::fmt::Debug;

use kstring::KString;
use tracing::warn;

use crate::escape::escape_json_str;
use crate::value::{Deferred, Value};


/// Shown in place of a json template interpolated directly into html.
pub const JSON_IN_HTML_WARNING: &str =
    "<div style=\"color:red;\">Please use dangerjson to include json in html. \
     Untrusted input needs to pass through a html template function to get \
     escaped. You can do html -> dangerjson -> html if you want!</div>";

/// Shown in place of a dangerjson template used where html or json
/// was expected.
pub const DANGERJSON_WARNING: &str =
    "<div style=\"color:red;\">Use json and not dangerjson. The purpose of \
     dangerjson is to be explicit when you embed unescaped json elements in \
     an html document.</div>";

/// The output syntax of a template, deciding the escaping of
/// interpolated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Html,
    Json,
    /// JSON meant to be embedded into html without escaping the
    /// results of deferred nodes.
    DangerJson,
}

impl Kind {
    pub fn is_json(self) -> bool {
        match self {
            Kind::Html => false,
            Kind::Json | Kind::DangerJson => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Html => "html",
            Kind::Json => "json",
            Kind::DangerJson => "dangerjson",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a scalar is converted while building the template or
/// when produced by a deferred node; only matters for `DangerJson`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Construction,
    Resolution,
}

pub enum Node<C> {
    /// Fixed text of the template, never escaped.
    Literal(KString),
    /// A value already converted to text safe for the enclosing kind.
    Escaped(KString),
    /// A nested template embedded without re-escaping.
    Trusted(Template<C>),
    Deferred(Deferred<C>),
    /// Several values interpolated at one place.
    Group(Vec<Node<C>>),
}

impl<C> Node<C> {
    pub fn is_resolved(&self) -> bool {
        match self {
            Node::Literal(_) | Node::Escaped(_) => true,
            Node::Trusted(t) => t.resolved,
            Node::Deferred(_) => false,
            Node::Group(nodes) => nodes.iter().all(Node::is_resolved),
        }
    }

    /// The text of a leaf node.
    pub fn leaf_text(&self) -> Option<&KString> {
        match self {
            Node::Literal(s) | Node::Escaped(s) => Some(s),
            Node::Trusted(_) | Node::Deferred(_) | Node::Group(_) => None,
        }
    }

    /// Convert an interpolated value to a node for a template of
    /// kind `parent`.
    pub(crate) fn from_value(parent: Kind, value: Value<C>, phase: Phase) -> Node<C> {
        match value {
            Value::Template(t) => Node::embed(parent, t),
            Value::Group(members) => Node::Group(
                members.into_iter().map(|t| Node::embed(parent, t)).collect()),
            Value::Deferred(d) => Node::Deferred(d),
            Value::Based(b) => Node::Escaped(
                if parent.is_json() {
                    KString::from_string(escape_json_str(b.as_str()))
                } else {
                    b.into_kstring()
                }),
            scalar => {
                let escaped = match (parent, phase) {
                    (Kind::Html, _) => scalar.escape_for_html(),
                    (Kind::DangerJson, Phase::Resolution) => match scalar {
                        Value::Text(s) => Some(s),
                        Value::Json(serde_json::Value::String(s)) =>
                            Some(KString::from_string(s)),
                        other => other.scalar_text().map(|s| KString::from_ref(&s)),
                    },
                    (Kind::Json | Kind::DangerJson, _) => scalar.escape_for_json(),
                };
                // escape_* only fail for non-scalars, which are all
                // matched above
                Node::Escaped(escaped.unwrap_or_default())
            }
        }
    }

    /// Embed the template `child` into a template of kind `parent`,
    /// applying the cross-context guard.
    pub(crate) fn embed(parent: Kind, child: Template<C>) -> Node<C> {
        match (parent, child.kind) {
            (Kind::Html, Kind::Html)
                | (Kind::Html, Kind::DangerJson)
                | (Kind::Json, Kind::Json)
                | (Kind::DangerJson, Kind::Json)
                | (Kind::DangerJson, Kind::DangerJson) => Node::Trusted(child),
            (Kind::Html, Kind::Json) => {
                warn!("json template interpolated into html, substituting warning");
                Node::Trusted(Template::warning(JSON_IN_HTML_WARNING))
            }
            (Kind::Json, Kind::DangerJson) => {
                warn!("dangerjson template interpolated into json, substituting warning");
                Node::Escaped(KString::from_string(escape_json_str(DANGERJSON_WARNING)))
            }
            (Kind::Json | Kind::DangerJson, Kind::Html) => {
                if child.resolved {
                    Node::Escaped(KString::from_string(
                        escape_json_str(&child.into_text())))
                } else {
                    // converted by the resolver
                    Node::Trusted(child)
                }
            }
        }
    }
}

impl<C> Debug for Node<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Node::Escaped(s) => f.debug_tuple("Escaped").field(s).finish(),
            Node::Trusted(t) => f.debug_tuple("Trusted").field(t).finish(),
            Node::Deferred(d) => d.fmt(f),
            Node::Group(nodes) => f.debug_tuple("Group").field(nodes).finish(),
        }
    }
}


/// An ordered sequence of nodes of one kind. `resolved` is true iff
/// no node in the tree is deferred.
pub struct Template<C> {
    pub(crate) kind: Kind,
    pub(crate) nodes: Vec<Node<C>>,
    pub(crate) resolved: bool,
}

impl<C> Template<C> {
    pub(crate) fn from_nodes(kind: Kind, nodes: Vec<Node<C>>) -> Self {
        let resolved = nodes.iter().all(Node::is_resolved);
        Template { kind, nodes, resolved }
    }

    /// An empty template of the given kind.
    pub fn empty(kind: Kind) -> Self {
        Template { kind, nodes: Vec::new(), resolved: true }
    }

    /// A fixed html fragment.
    pub fn warning(text: &'static str) -> Self {
        Template {
            kind: Kind::Html,
            nodes: vec![Node::Literal(KString::from_static(text))],
            resolved: true,
        }
    }

    pub fn kind(&self) -> Kind { self.kind }
    pub fn is_resolved(&self) -> bool { self.resolved }
    pub fn nodes(&self) -> &[Node<C>] { &self.nodes }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
}

impl<C> Debug for Template<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template")
            .field("kind", &self.kind)
            .field("resolved", &self.resolved)
            .field("nodes", &self.nodes)
            .finish()
    }
}


/// Collects the parts of a template in order; used by the
/// constructor functions and macros.
pub struct TemplateBuilder<C> {
    kind: Kind,
    nodes: Vec<Node<C>>,
}

impl<C> TemplateBuilder<C> {
    pub fn new(kind: Kind) -> Self {
        TemplateBuilder { kind, nodes: Vec::new() }
    }

    /// Append a fixed part of the template; not escaped.
    pub fn literal(&mut self, s: &str) -> &mut Self {
        if !s.is_empty() {
            self.nodes.push(Node::Literal(KString::from_ref(s)));
        }
        self
    }

    /// Append a static fixed part without copying it.
    pub fn static_literal(&mut self, s: &'static str) -> &mut Self {
        if !s.is_empty() {
            self.nodes.push(Node::Literal(KString::from_static(s)));
        }
        self
    }

    /// Append an interpolated value, escaped for the kind of the
    /// template being built.
    pub fn value(&mut self, v: impl Into<Value<C>>) -> &mut Self {
        self.nodes.push(Node::from_value(self.kind, v.into(), Phase::Construction));
        self
    }

    pub fn finish(&mut self) -> Template<C> {
        Template::from_nodes(self.kind, std::mem::take(&mut self.nodes))
    }
}

fn build<C>(kind: Kind, strings: &[&str], values: Vec<Value<C>>) -> Template<C> {
    let mut builder = TemplateBuilder::new(kind);
    let mut values = values.into_iter();
    for s in strings {
        builder.literal(s);
        if let Some(v) = values.next() {
            builder.value(v);
        }
    }
    builder.finish()
}

/// Build an html template: `strings[i]` is followed by `values[i]`.
pub fn html<C>(strings: &[&str], values: Vec<Value<C>>) -> Template<C> {
    build(Kind::Html, strings, values)
}

/// Same as `html`.
pub fn css<C>(strings: &[&str], values: Vec<Value<C>>) -> Template<C> {
    build(Kind::Html, strings, values)
}

/// Build a json template; interpolated values become JSON values.
pub fn json<C>(strings: &[&str], values: Vec<Value<C>>) -> Template<C> {
    build(Kind::Json, strings, values)
}

/// Build json meant to be embedded unescaped in an html document.
pub fn dangerjson<C>(strings: &[&str], values: Vec<Value<C>>) -> Template<C> {
    build(Kind::DangerJson, strings, values)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::lazy;

    type T = Template<()>;

    fn text(t: T) -> String {
        t.render().unwrap()
    }

    #[test]
    fn t_html_escapes_values() {
        let t: T = html(&["<h1>", "</h1>"], vec!["<b>x</b>".into()]);
        assert!(t.is_resolved());
        assert_eq!(text(t), "<h1>&lt;b&gt;x&lt;/b&gt;</h1>");
    }

    #[test]
    fn t_extra_and_missing_values() {
        let t: T = html(&["a", "b", "c"], vec![1.into()]);
        assert_eq!(text(t), "a1bc");
        let t: T = html(&["a"], vec![1.into(), 2.into()]);
        assert_eq!(text(t), "a1");
    }

    #[test]
    fn t_empty_values() {
        let t: T = html(&["[", "|", "|", "]"],
                        vec![().into(), None::<i32>.into(), "".into()]);
        assert_eq!(text(t), "[||]");
    }

    #[test]
    fn t_json_values() {
        let t: T = json(&["", ""], vec![42.into()]);
        assert_eq!(text(t), "42");
        let t: T = json(&["", ""], vec!["hi".into()]);
        assert_eq!(text(t), "\"hi\"");
        let t: T = json(&["{\"a\": ", "}"], vec![serde_json::json!([1, "<b>"]).into()]);
        assert_eq!(text(t), "{\"a\": [1,\"<b>\"]}");
    }

    #[test]
    fn t_json_roundtrip() {
        let vals = [serde_json::json!(42), serde_json::json!("hi \"there\""),
                    serde_json::json!(true), serde_json::json!(null),
                    serde_json::json!(-1.25), serde_json::json!({"k": [1, 2]})];
        for v in vals {
            let t: T = json(&["", ""], vec![v.clone().into()]);
            let back: serde_json::Value = serde_json::from_str(&text(t)).unwrap();
            assert_eq!(back, v);
        }
    }

    #[test]
    fn t_json_in_html_is_rejected() {
        let inner: T = json(&["{\"secret\": ", "}"], vec!["<script>".into()]);
        let t: T = html(&["<div>", "</div>"], vec![inner.into()]);
        let s = text(t);
        assert!(!s.contains("secret"));
        assert!(s.contains("Please use dangerjson to include json in html"));
    }

    #[test]
    fn t_dangerjson_in_html_is_trusted() {
        let inner: T = dangerjson(&["{\"v\": ", "}"], vec!["x".into()]);
        let t: T = html(&["<script>", "</script>"], vec![inner.into()]);
        assert_eq!(text(t), "<script>{\"v\": \"x\"}</script>");
    }

    #[test]
    fn t_dangerjson_in_json_is_rejected() {
        let inner: T = dangerjson(&["{\"v\": 1}"], vec![]);
        let t: T = json(&["{\"a\": ", "}"], vec![inner.into()]);
        let s = text(t);
        let back: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert!(back["a"].as_str().unwrap().contains("Use json and not dangerjson"));
    }

    #[test]
    fn t_json_nests_structurally() {
        let inner: T = json(&["{\"b\": ", "}"], vec![1.into()]);
        let t: T = json(&["{\"a\": ", "}"], vec![inner.into()]);
        let back: serde_json::Value = serde_json::from_str(&text(t)).unwrap();
        assert_eq!(back, serde_json::json!({"a": {"b": 1}}));
    }

    #[test]
    fn t_html_in_json_becomes_string() {
        let inner: T = html(&["<b>", "</b>"], vec!["a&b".into()]);
        let t: T = json(&["{\"html\": ", "}"], vec![inner.into()]);
        let back: serde_json::Value = serde_json::from_str(&text(t)).unwrap();
        assert_eq!(back, serde_json::json!({"html": "<b>a&amp;b</b>"}));
    }

    #[test]
    fn t_based_in_html_and_json() {
        let b = crate::based_html!("<i>" {"<x>"} "</i>");
        let t: T = html(&["", ""], vec![b.clone().into()]);
        assert_eq!(text(t), "<i>&lt;x&gt;</i>");
        let t: T = json(&["", ""], vec![b.into()]);
        assert_eq!(text(t), "\"<i>&lt;x&gt;</i>\"");
    }

    #[test]
    fn t_resolved_flag() {
        let t: T = html(&["a"], vec![]);
        assert!(t.is_resolved());
        let t: T = html(&["a", ""], vec![lazy(|_: &mut ()| "x")]);
        assert!(!t.is_resolved());
        let outer: T = html(&["<p>", "</p>"], vec![t.into()]);
        assert!(!outer.is_resolved());
        let members: Vec<T> = vec![html(&["a"], vec![]), html(&["b"], vec![])];
        let group: T = html(&["", ""], vec![members.into()]);
        assert!(group.is_resolved());
        let members: Vec<T> = vec![html(&["a"], vec![]),
                                   html(&["", ""], vec![lazy(|_: &mut ()| 1)])];
        let group: T = html(&["", ""], vec![members.into()]);
        assert!(!group.is_resolved());
    }

    #[test]
    fn t_json_members_of_html_group_are_rejected() {
        let group: Vec<T> = vec![html(&["<p>ok</p>"], vec![]),
                                 json(&["{\"leak\": 1}"], vec![])];
        let t: T = html(&["", ""], vec![group.into()]);
        let s = text(t);
        assert!(s.starts_with("<p>ok</p>"));
        assert!(!s.contains("leak"));
        assert!(s.contains("Please use dangerjson"));
    }
}
