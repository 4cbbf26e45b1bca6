//! The table of pages, dispatching requests to their handlers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Result, bail};
use kstring::KString;
use lazyhtml::{lazy, Value};
use rouille::{Request, Response};
use tracing::{debug, warn};

use crate::document::DocumentConfig;
use crate::handler::{handle_with_mini, Handler};
use crate::mini::{Mini, RequestInfo};
use crate::url_encoding::form_encode;
use crate::webutils::{errorpage_from_error, errorpage_from_status};


/// Produces the application data for a request, before the handler
/// is run.
pub type DataMaker<D> = Box<dyn Fn(&RequestInfo) -> Result<D> + Send + Sync>;

/// The paths under which `path` is served: with a leading slash,
/// with and without a trailing slash. The first one is the canonical
/// form. `/` only maps to itself.
pub fn generate_variations(path: &str) -> Vec<String> {
    if path == "/" {
        return vec!["/".into()]
    }
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let other = match path.strip_suffix('/') {
        Some(without) => without.to_string(),
        None => format!("{path}/"),
    };
    vec![path, other]
}


/// All variations of the paths registered in a table. Shared with
/// every request of the table, so that links can be checked.
#[derive(Debug, Clone, Default)]
pub struct Paths(Arc<HashSet<KString>>);

impl Paths {
    /// `path` if a page is registered for it.
    pub fn get<'p>(&self, path: &'p str) -> Option<&'p str> {
        let canonical = generate_variations(path).into_iter().next()?;
        if self.0.contains(canonical.as_str()) {
            Some(path)
        } else {
            None
        }
    }

    fn insert(&mut self, path: KString) {
        Arc::make_mut(&mut self.0).insert(path);
    }
}


struct Route<D> {
    /// The canonical variation of the registered path.
    path: KString,
    handler: Arc<dyn Handler<D>>,
}

pub struct UrlTable<D = ()> {
    routes: HashMap<KString, Route<D>>,
    paths: Paths,
    data_maker: DataMaker<D>,
    config: DocumentConfig,
}

impl UrlTable<()> {
    pub fn new() -> Self {
        UrlTable::with_data(|_| Ok(()))
    }
}

impl Default for UrlTable<()> {
    fn default() -> Self {
        UrlTable::new()
    }
}

impl<D: 'static> UrlTable<D> {
    /// A table whose handlers see the result of `data_maker` as
    /// `mini.data`.
    pub fn with_data(data_maker: impl Fn(&RequestInfo) -> Result<D> + Send + Sync + 'static)
                     -> Self {
        UrlTable {
            routes: HashMap::new(),
            paths: Paths::default(),
            data_maker: Box::new(data_maker),
            config: DocumentConfig::default(),
        }
    }

    pub fn set_config(&mut self, config: DocumentConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// See the free function `generate_variations`.
    pub fn generate_variations(path: &str) -> Vec<String> {
        generate_variations(path)
    }

    /// Serve `handler` at `path` (and its variations). Chaining; it's
    /// an error to register a path twice.
    pub fn set(&mut self, path: &str, handler: impl Handler<D> + 'static) -> Result<&mut Self> {
        let handler: Arc<dyn Handler<D>> = Arc::new(handler);
        let variations = generate_variations(path);
        let canonical = KString::from_ref(&variations[0]);
        for variation in &variations {
            if let Some(old) = self.routes.get(variation.as_str()) {
                bail!("already contained an entry for {:?}: {:?}",
                      variation, old.handler)
            }
        }
        for variation in variations {
            debug!("route {variation:?} -> {handler:?}");
            let variation = KString::from_string(variation);
            self.paths.insert(variation.clone());
            self.routes.insert(variation,
                               Route { path: canonical.clone(),
                                       handler: handler.clone() });
        }
        Ok(self)
    }

    /// `path` if a page is registered for it.
    pub fn get<'p>(&self, path: &'p str) -> Option<&'p str> {
        self.paths.get(path)
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Dispatch `request` to the handler registered for its path,
    /// resolve the page and build the response: 404 for unknown
    /// paths, 500 if anything fails.
    pub fn respond(&self, request: &Request) -> Response {
        let path = request.url();
        let route = match self.routes.get(path.as_str()) {
            Some(route) => route,
            None => {
                debug!("no page for {path:?}");
                return errorpage_from_status(404)
            }
        };
        match self.respond_with(route, request) {
            Ok(response) => response,
            Err(e) => errorpage_from_error(
                e.context(format!("{} {}", request.method(), request.raw_url()))),
        }
    }

    fn respond_with(&self, route: &Route<D>, request: &Request) -> Result<Response> {
        let info = match RequestInfo::from_request(request) {
            Ok(info) => info,
            Err(e) => {
                warn!("bad request: {e:#}");
                return Ok(errorpage_from_status(400))
            }
        };
        let data = (self.data_maker)(&info)?;
        let mini = Mini::new(info, route.path.clone(), data)
            .with_paths(self.paths.clone());
        pollster::block_on(handle_with_mini(mini, route.handler.as_ref(), &self.config))
    }
}


/// Like `URLSearchParams.set`: replace the value of `key`, or append.
fn set_param<'a>(params: &mut Vec<(&'a str, &'a str)>, key: &'a str, value: &'a str) {
    match params.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => params.push((key, value)),
    }
}

/// The href for a link to `path` from the page of `mini`: the query
/// parameters named in `keep` are carried over from the current
/// request (if non-empty), then `settings` are applied (`None`
/// values are skipped). Paths not registered with the table lead to
/// `/url_not_found_error`.
pub fn currylink<D: 'static>(
    mini: &Mini<D>,
    path: &str,
    keep: &[&str],
    settings: &[(&str, Option<&str>)],
) -> String {
    let mut href = match mini.url_get(path) {
        Some(p) if p.starts_with('/') => p.to_string(),
        Some(p) => format!("/{p}"),
        None => {
            warn!("link to unknown path {path:?} from {:?}", mini.route());
            "/url_not_found_error".into()
        }
    };
    let mut params: Vec<(&str, &str)> = Vec::new();
    for key in keep {
        if let Some(value) = mini.params().get(key).filter(|v| !v.is_empty()) {
            set_param(&mut params, key, value);
        }
    }
    for (key, value) in settings {
        if let Some(value) = value {
            set_param(&mut params, key, value);
        }
    }
    for (i, (key, value)) in params.iter().enumerate() {
        href.push(if i == 0 { '?' } else { '&' });
        href.push_str(&form_encode(key));
        href.push('=');
        href.push_str(&form_encode(value));
    }
    href
}

/// `currylink` as a deferred value, to be put into a template:
/// `html!("<a href=\"" {link("/login", &["lang"], &[])} "\">")`.
pub fn link<D: 'static>(
    path: &str,
    keep: &[&str],
    settings: &[(&str, Option<&str>)],
) -> Value<Mini<D>> {
    let path = path.to_string();
    let keep: Vec<String> = keep.iter().map(|k| k.to_string()).collect();
    let settings: Vec<(String, Option<String>)> = settings.iter()
        .map(|(k, v)| (k.to_string(), v.map(String::from)))
        .collect();
    lazy(move |mini: &mut Mini<D>| {
        let keep: Vec<&str> = keep.iter().map(String::as_str).collect();
        let settings: Vec<(&str, Option<&str>)> = settings.iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
            .collect();
        currylink(mini, &path, &keep, &settings)
    })
}


#[cfg(test)]
mod tests {
    use lazyhtml::{lazy, Template};

    use super::*;
    use crate::handler::FnHandler;
    use crate::responder::tests::body_of;

    fn get<D: 'static>(table: &UrlTable<D>, url: &str) -> Response {
        table.respond(&Request::fake_http("GET", url, vec![], vec![]))
    }

    #[test]
    fn t_generate_variations() {
        type T = UrlTable<()>;
        assert_eq!(T::generate_variations("/"), ["/"]);
        assert_eq!(T::generate_variations("/a"), ["/a", "/a/"]);
        assert_eq!(T::generate_variations("a"), ["/a", "/a/"]);
        assert_eq!(T::generate_variations("/a/"), ["/a/", "/a"]);
        assert_eq!(T::generate_variations("a/b/"), ["/a/b/", "/a/b"]);
    }

    #[test]
    fn t_set_and_get() -> Result<()> {
        let mut table = UrlTable::new();
        table
            .set("/hello", FnHandler::new(|_: &mut Mini| Ok("hi")))?
            .set("bye/", FnHandler::new(|_: &mut Mini| Ok("bye")))?;
        assert_eq!(table.get("/hello"), Some("/hello"));
        assert_eq!(table.get("hello"), Some("hello"));
        assert_eq!(table.get("/bye/"), Some("/bye/"));
        assert_eq!(table.get("/nope"), None);
        assert!(table.set("/hello/", FnHandler::new(|_: &mut Mini| Ok(()))).is_err());
        Ok(())
    }

    #[test]
    fn t_end_to_end() -> Result<()> {
        let mut table = UrlTable::new();
        table.set("/", FnHandler::new(|_: &mut Mini| -> Result<Template<Mini>> {
            Ok(lazyhtml::html!("<h1>" {"<b>x</b>"} "</h1>"))
        }))?;
        let r = get(&table, "/");
        assert_eq!(r.status_code, 200);
        assert_eq!(r.headers.iter()
                   .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                   .map(|(_, v)| v.as_ref()),
                   Some("text/html; charset=utf-8"));
        let body = body_of(r);
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<h1>&lt;b&gt;x&lt;/b&gt;</h1>"));
        Ok(())
    }

    #[test]
    fn t_not_found_and_failure() -> Result<()> {
        let mut table = UrlTable::new();
        table.set("/fail", FnHandler::new(|_: &mut Mini| -> Result<Template<Mini>> {
            Ok(lazyhtml::html!(
                {lazyhtml::try_lazy(|_: &mut Mini| -> Result<i32> { bail!("db gone") })}))
        }))?;
        assert_eq!(get(&table, "/missing").status_code, 404);
        let r = get(&table, "/fail/");
        assert_eq!(r.status_code, 500);
        assert!(!body_of(r).contains("db gone"));
        assert_eq!(get(&table, "/fail?x=%zz").status_code, 400);
        Ok(())
    }

    #[test]
    fn t_data_maker_and_route() -> Result<()> {
        let mut table = UrlTable::with_data(
            |info: &RequestInfo| Ok(info.params().get("name").unwrap_or("nobody").to_string()));
        table.set("/greet", FnHandler::new(|mini: &mut Mini<String>| -> Result<Template<Mini<String>>> {
            let name = mini.data.clone();
            Ok(lazyhtml::html!("<p>" {name} " at " {lazy(|m: &mut Mini<String>| m.route().to_string())} "</p>"))
        }))?;
        let body = body_of(get(&table, "/greet/?name=%3Ci%3E"));
        assert!(body.contains("<p>&lt;i&gt; at /greet</p>"));
        Ok(())
    }

    #[test]
    fn t_route_is_canonical() -> Result<()> {
        let mut table = UrlTable::new();
        table.set("bye/", FnHandler::new(|_: &mut Mini| -> Result<Template<Mini>> {
            Ok(lazyhtml::html!("<p>" {lazy(|m: &mut Mini| m.route().to_string())} "</p>"))
        }))?;
        assert!(body_of(get(&table, "/bye")).contains("<p>/bye/</p>"));
        assert!(body_of(get(&table, "/bye/")).contains("<p>/bye/</p>"));
        Ok(())
    }

    #[test]
    fn t_link() -> Result<()> {
        let mut table = UrlTable::new();
        table
            .set("/login", FnHandler::new(|_: &mut Mini| Ok(())))?
            .set("search/", FnHandler::new(|_: &mut Mini| Ok(())))?
            .set("/page", FnHandler::new(|_: &mut Mini| -> Result<Template<Mini>> {
                Ok(lazyhtml::html!(
                    "<a href=\"" {link("/login", &["lang", "empty", "missing"], &[])} "\">"
                    "<a href=\"" {link("search/", &["q", "lang"],
                                        &[("lang", Some("en")), ("page", Some("2")),
                                          ("skip", None)])} "\">"
                    "<a href=\"" {link("nowhere", &["lang"], &[])} "\">"))
            }))?;
        let body = body_of(get(&table, "/page?lang=de&q=a+b%26c&empty="));
        assert!(body.contains("<a href=\"/login?lang=de\">"));
        assert!(body.contains("<a href=\"/search/?q=a+b%26c&amp;lang=en&amp;page=2\">"));
        assert!(body.contains("<a href=\"/url_not_found_error\">"));

        let body = body_of(get(&table, "/page"));
        assert!(body.contains("<a href=\"/login\">"));
        assert!(body.contains("<a href=\"/search/?lang=en&amp;page=2\">"));
        Ok(())
    }

    #[test]
    fn t_paths() -> Result<()> {
        let mut table = UrlTable::new();
        let before = table.paths().clone();
        table.set("a", FnHandler::new(|_: &mut Mini| Ok(())))?;
        assert_eq!(table.paths().get("/a/"), Some("/a/"));
        assert_eq!(before.get("/a"), None);
        Ok(())
    }
}
