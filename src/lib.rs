//! A small web framework around lazily resolved html templates: a
//! table of pages, each produced by a handler whose template may
//! contain deferred parts that are run against the per-request
//! context (`Mini`) before the response is streamed.

pub mod util;
pub mod url_encoding;
pub mod http_request_method;
pub mod query;
pub mod aresponse;
pub mod mini;
pub mod document;
pub mod webutils;
pub mod responder;
pub mod handler;
pub mod url;
pub mod rouille_runner;

pub use lazyhtml;

pub use document::{default_head, set_default_head, DocumentConfig};
pub use handler::{handle_with_mini, AsyncFnHandler, FnHandler, Handler, Page};
pub use mini::{Mini, Redirect, RequestInfo};
pub use responder::html_responder;
pub use url::UrlTable;
