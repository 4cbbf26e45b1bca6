//! Context-free html fragments, escaped and concatenated eagerly at
//! construction.

use std::fmt::Display;

use kstring::KString;

use crate::escape::escape_html;


/// Html text that is safe to embed as is. Built only from primitives
/// (which are escaped) and other `BasedHtml` values, hence it never
/// needs a context and can be kept in process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BasedHtml(KString);

impl BasedHtml {
    /// Wrap markup that the caller vouches for, e.g. a script read
    /// from a configuration file. Nothing is escaped.
    pub fn preserialized(s: impl Into<KString>) -> Self {
        BasedHtml(s.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_kstring(self) -> KString {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for BasedHtml {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for BasedHtml {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}


/// The values a `BasedHtml` may interpolate. There is no way to put
/// a deferred computation in here.
#[derive(Debug, Clone, PartialEq)]
pub enum BasedValue {
    Empty,
    Text(KString),
    Number(serde_json::Number),
    Bool(bool),
    Based(BasedHtml),
    List(Vec<BasedHtml>),
}

impl BasedValue {
    fn push_to(&self, out: &mut String) {
        match self {
            BasedValue::Empty => (),
            BasedValue::Text(s) => out.push_str(&escape_html(s)),
            BasedValue::Number(n) => out.push_str(&n.to_string()),
            BasedValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            BasedValue::Based(b) => out.push_str(b.as_str()),
            BasedValue::List(items) => for b in items {
                out.push_str(b.as_str())
            },
        }
    }
}

impl From<&str> for BasedValue {
    fn from(s: &str) -> Self {
        BasedValue::Text(KString::from_ref(s))
    }
}

impl From<String> for BasedValue {
    fn from(s: String) -> Self {
        BasedValue::Text(KString::from_string(s))
    }
}

impl From<&String> for BasedValue {
    fn from(s: &String) -> Self {
        BasedValue::Text(KString::from_ref(s))
    }
}

impl From<KString> for BasedValue {
    fn from(s: KString) -> Self {
        BasedValue::Text(s)
    }
}

macro_rules! based_from_integer {
    ($($t:ty)*) => {
        $(
            impl From<$t> for BasedValue {
                fn from(n: $t) -> Self {
                    BasedValue::Number(serde_json::Number::from(n))
                }
            }
        )*
    }
}

based_from_integer!(i8 i16 i32 i64 isize u8 u16 u32 u64 usize);

impl From<f64> for BasedValue {
    fn from(x: f64) -> Self {
        match serde_json::Number::from_f64(x) {
            Some(n) => BasedValue::Number(n),
            None => BasedValue::Empty,
        }
    }
}

impl From<bool> for BasedValue {
    fn from(b: bool) -> Self {
        BasedValue::Bool(b)
    }
}

impl From<()> for BasedValue {
    fn from(_: ()) -> Self {
        BasedValue::Empty
    }
}

impl<T: Into<BasedValue>> From<Option<T>> for BasedValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(BasedValue::Empty, Into::into)
    }
}

impl From<BasedHtml> for BasedValue {
    fn from(b: BasedHtml) -> Self {
        BasedValue::Based(b)
    }
}

impl From<&BasedHtml> for BasedValue {
    fn from(b: &BasedHtml) -> Self {
        BasedValue::Based(b.clone())
    }
}

impl From<Vec<BasedHtml>> for BasedValue {
    fn from(items: Vec<BasedHtml>) -> Self {
        BasedValue::List(items)
    }
}


/// Builds a `BasedHtml`; construction is the resolution.
#[derive(Debug, Default)]
pub struct BasedBuilder {
    out: String,
}

impl BasedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(&mut self, s: &str) -> &mut Self {
        self.out.push_str(s);
        self
    }

    pub fn static_literal(&mut self, s: &'static str) -> &mut Self {
        self.literal(s)
    }

    pub fn value(&mut self, v: impl Into<BasedValue>) -> &mut Self {
        v.into().push_to(&mut self.out);
        self
    }

    pub fn finish(&mut self) -> BasedHtml {
        BasedHtml(KString::from_string(std::mem::take(&mut self.out)))
    }
}

/// Build a `BasedHtml`: `strings[i]` is followed by `values[i]`.
pub fn based_html(strings: &[&str], values: Vec<BasedValue>) -> BasedHtml {
    let mut builder = BasedBuilder::new();
    let mut values = values.into_iter();
    for s in strings {
        builder.literal(s);
        if let Some(v) = values.next() {
            builder.value(v);
        }
    }
    builder.finish()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_based_html() {
        let b = based_html(&["<h2>", " ", "</h2>"],
                           vec!["<script>alert(1)</script>".into(), 7.into()]);
        assert_eq!(b.as_str(), "<h2>&lt;script&gt;alert(1)&lt;/script&gt; 7</h2>");
    }

    #[test]
    fn t_nesting_does_not_double_escape() {
        let inner = based_html(&["<b>", "</b>"], vec!["a&b".into()]);
        let outer = based_html(&["<p>", "</p>"], vec![inner.into()]);
        assert_eq!(outer.to_string(), "<p><b>a&amp;b</b></p>");
    }

    #[test]
    fn t_list_is_joined() {
        let items: Vec<BasedHtml> = ["x", "<y>", "z"].iter()
            .map(|s| based_html(&["<li>", "</li>"], vec![(*s).into()]))
            .collect();
        let ul = based_html(&["<ul>", "</ul>"], vec![items.into()]);
        assert_eq!(ul.as_str(), "<ul><li>x</li><li>&lt;y&gt;</li><li>z</li></ul>");
    }

    #[test]
    fn t_empty_values() {
        let b = based_html(&["[", "|", "]"], vec![().into(), None::<&str>.into()]);
        assert_eq!(b.as_str(), "[|]");
        assert!(BasedHtml::default().is_empty());
    }
}
