//! Escaping of values for the two output syntaxes. Both functions
//! are total: every input has an escaped form.

use std::borrow::Cow;

/// Replace the HTML special characters `& < > " '` by their entity
/// forms. Returns the input unchanged (borrowed) if there is nothing
/// to escape.
pub fn escape_html(s: &str) -> Cow<str> {
    let mut out: Option<String> = None;
    let mut done = 0;
    for (i, b) in s.bytes().enumerate() {
        let entity = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            b'\'' => "&#39;",
            _ => continue
        };
        // All replaced bytes are ASCII, hence `i` and `i + 1` are
        // always char boundaries.
        let buf = out.get_or_insert_with(|| String::with_capacity(s.len() + 16));
        buf.push_str(&s[done..i]);
        buf.push_str(entity);
        done = i + 1;
    }
    match out {
        None => Cow::Borrowed(s),
        Some(mut buf) => {
            buf.push_str(&s[done..]);
            Cow::Owned(buf)
        }
    }
}

/// A string as a JSON string literal, with `JSON.stringify`
/// semantics: quoted, backslashes, quotes and control characters
/// escaped.
pub fn escape_json_str(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Any JSON value serialized compactly (numbers and booleans
/// verbatim).
pub fn escape_json(v: &serde_json::Value) -> String {
    v.to_string()
}
