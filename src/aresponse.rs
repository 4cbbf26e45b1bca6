//! Status and headers of a response under construction.

use std::borrow::Cow;

use rouille::{Response, ResponseBody};


pub type Headers = Vec<(Cow<'static, str>, Cow<'static, str>)>;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

macro_rules! cow {
    ($a:expr, $b:expr) => {
        (Cow::from($a), Cow::from($b))
    }
}

/// What a handler may set about the response besides the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseOptions {
    pub status: u16,
    pub headers: Headers,
}

impl Default for ResponseOptions {
    /// Status 200 with an html content type.
    fn default() -> Self {
        ResponseOptions {
            status: 200,
            headers: vec![cow!(CONTENT_TYPE, HTML_CONTENT_TYPE)],
        }
    }
}

impl ResponseOptions {
    pub fn new(status: u16, headers: Headers) -> Self {
        ResponseOptions { status, headers }
    }

    /// First value of the header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
    }

    /// Set `name` to `value`, replacing all existing values of the
    /// header.
    pub fn set_header(&mut self,
                      name: impl Into<Cow<'static, str>>,
                      value: impl Into<Cow<'static, str>>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Merge `headers` into ours: a header given in `headers`
    /// replaces ours of the same name, others are kept.
    pub fn merge_headers(&mut self, headers: Headers) {
        for (name, value) in headers {
            self.set_header(name, value);
        }
    }

    /// Turn into a rouille response with `body`.
    pub fn into_response(self, body: ResponseBody) -> Response {
        Response {
            status_code: self.status,
            headers: self.headers,
            data: body,
            upgrade: None,
        }
    }
}
