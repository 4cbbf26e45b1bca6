//! The per-request context handed to handlers and to every deferred
//! node of their templates.

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::Result;
use kstring::KString;
use lazyhtml::{Kind, Template, TemplateBuilder, Value};
use rouille::Request;
use tracing::debug;

use crate::aresponse::{Headers, ResponseOptions};
use crate::http_request_method::HttpRequestMethod;
use crate::query::QueryString;
use crate::url::Paths;


/// What the handlers get to see of the request. Owned, so that the
/// context can outlive the borrow of the rouille `Request`.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    method: HttpRequestMethod,
    raw_url: String,
    path: String,
    query_string: String,
    params: QueryString,
    headers: Vec<(String, String)>,
    remote_addr: SocketAddr,
}

impl RequestInfo {
    pub fn from_request(request: &Request) -> Result<Self> {
        let method = HttpRequestMethod::from_str(request.method())?;
        let query_string = request.raw_query_string().to_string();
        let params = QueryString::from_str(&query_string)?;
        Ok(RequestInfo {
            method,
            raw_url: request.raw_url().to_string(),
            path: request.url(),
            query_string,
            params,
            headers: request.headers()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            remote_addr: *request.remote_addr(),
        })
    }

    pub fn method(&self) -> HttpRequestMethod { self.method }
    /// Path and query string as sent by the client.
    pub fn raw_url(&self) -> &str { &self.raw_url }
    /// Path only, decoded.
    pub fn path(&self) -> &str { &self.path }
    /// `foo` part in `?foo`
    pub fn query_string(&self) -> &str { &self.query_string }
    pub fn params(&self) -> &QueryString { &self.params }
    pub fn remote_addr(&self) -> &SocketAddr { &self.remote_addr }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Like the request part in Apache style Combined Log Format
    pub fn request_line(&self) -> String {
        format!("{} {}", self.method, self.raw_url)
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub url: String,
    pub status: u16,
}


/// The handbag: request, route and application data, plus the side
/// channels through which a handler (or any of its deferred nodes)
/// shapes the response.
pub struct Mini<D = ()> {
    request: RequestInfo,
    route: KString,
    pub data: D,
    head: Option<Template<Mini<D>>>,
    options: ResponseOptions,
    redirect: Option<Redirect>,
    paths: Paths,
}

impl<D: 'static> Mini<D> {
    pub fn new(request: RequestInfo, route: impl Into<KString>, data: D) -> Self {
        Mini {
            request,
            route: route.into(),
            data,
            head: None,
            options: ResponseOptions::default(),
            redirect: None,
            paths: Paths::default(),
        }
    }

    /// The paths of the table serving this request, for `url_get`.
    pub fn with_paths(mut self, paths: Paths) -> Self {
        self.paths = paths;
        self
    }

    pub fn request(&self) -> &RequestInfo { &self.request }
    /// The registered path that matched the request.
    pub fn route(&self) -> &str { &self.route }
    pub fn params(&self) -> &QueryString { self.request.params() }
    /// `path` if the table serving this request has a page for it.
    pub fn url_get<'p>(&self, path: &'p str) -> Option<&'p str> {
        self.paths.get(path)
    }

    /// Use `head` as the document head instead of the configured
    /// default one.
    pub fn head(&mut self, head: impl Into<Value<Mini<D>>>) {
        self.head = Some(TemplateBuilder::new(Kind::Html).value(head).finish());
    }

    /// Add `headers` to the response, replacing those with the same
    /// names; with `overwrite`, replace all headers (including the
    /// content type) by `headers`.
    pub fn headers(&mut self, headers: Headers, overwrite: bool) {
        if overwrite {
            self.options.headers = headers;
        } else {
            self.options.merge_headers(headers);
        }
    }

    /// Replace status and headers of the response.
    pub fn options(&mut self, options: ResponseOptions) {
        self.options = options;
    }

    /// Answer with a redirect to `url` instead of the page; status
    /// 302 by default.
    pub fn redirect(&mut self, url: impl Into<String>, status: Option<u16>) {
        let redirect = Redirect { url: url.into(), status: status.unwrap_or(302) };
        debug!("redirect requested: {redirect:?}");
        self.redirect = Some(redirect);
    }

    /// See `lazyhtml::deliver`.
    pub fn deliver(&self, name: &str, value: &serde_json::Value) -> Template<Mini<D>> {
        lazyhtml::deliver(name, value)
    }

    pub fn response_options(&self) -> &ResponseOptions { &self.options }
    pub fn redirect_target(&self) -> Option<&Redirect> { self.redirect.as_ref() }

    pub(crate) fn take_head(&mut self) -> Option<Template<Mini<D>>> {
        self.head.take()
    }
    pub(crate) fn take_redirect(&mut self) -> Option<Redirect> {
        self.redirect.take()
    }
    pub(crate) fn take_options(&mut self) -> ResponseOptions {
        std::mem::take(&mut self.options)
    }
}
