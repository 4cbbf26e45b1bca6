//! Decoded query string parameters.

use kstring::KString;

use crate::url_encoding::{form_decode, UrlDecodingError};


/// The `key=value` pairs of a query string, decoded, in their
/// original order. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString(Vec<(KString, KString)>);

impl QueryString {
    /// Parse the part after `?` (without the `?`).
    pub fn from_str(s: &str) -> Result<Self, UrlDecodingError> {
        let mut v = Vec::new();
        for partraw in s.split('&') {
            if ! partraw.is_empty() {
                let (key, val) = partraw.split_once('=').unwrap_or((partraw, ""));
                v.push((form_decode(key)?.into(),
                        form_decode(val)?.into()));
            }
        }
        Ok(QueryString(v))
    }

    /// The first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'s>(&'s self, key: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.0.iter()
            .filter(move |(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}
