use std::any::type_name;
use std::fmt::Debug;
use std::marker::PhantomData;

use anyhow::Result;
use futures::future::LocalBoxFuture;
use lazyhtml::{html, Kind, Template};
use rouille::Response;

use crate::document::DocumentConfig;
use crate::mini::Mini;
use crate::responder::html_responder;
use crate::webutils::redirect_response;


/// What a handler returns: a (possibly unresolved) template, or text
/// that is shown escaped, or nothing.
pub enum Page<C> {
    Template(Template<C>),
    Text(String),
    Nothing,
}

impl<C> Page<C> {
    pub fn into_template(self) -> Template<C> {
        match self {
            Page::Template(t) => t,
            Page::Text(s) => html(&["", ""], vec![s.into()]),
            Page::Nothing => Template::empty(Kind::Html),
        }
    }
}

impl<C> From<Template<C>> for Page<C> {
    fn from(t: Template<C>) -> Self {
        Page::Template(t)
    }
}

impl<C> From<String> for Page<C> {
    fn from(s: String) -> Self {
        Page::Text(s)
    }
}

impl<C> From<&str> for Page<C> {
    fn from(s: &str) -> Self {
        Page::Text(s.into())
    }
}

impl<C> From<()> for Page<C> {
    fn from(_: ()) -> Self {
        Page::Nothing
    }
}


pub trait Handler<D>: Debug + Send + Sync {
    /// Produce the page. Err means the handler failed; this is
    /// answered with an internal server error. The page may still
    /// contain deferred nodes, which are run with the same `mini`.
    fn call<'a>(&'a self, mini: &'a mut Mini<D>) -> LocalBoxFuture<'a, Result<Page<Mini<D>>>>;
}

// ------------------------------------------------------------------
/// A Handler from a synchronous Fn.
pub struct FnHandler<D, P, F>
where F: Fn(&mut Mini<D>) -> Result<P> + Send + Sync
{
    phantom: PhantomData<fn() -> (D, P)>,
    handler: F,
}

impl<D, P, F> FnHandler<D, P, F>
where F: Fn(&mut Mini<D>) -> Result<P> + Send + Sync
{
    pub fn new(handler: F) -> Self {
        Self {
            phantom: PhantomData,
            handler,
        }
    }
}

impl<D, P, F> Handler<D> for FnHandler<D, P, F>
where P: Into<Page<Mini<D>>>,
      F: Fn(&mut Mini<D>) -> Result<P> + Send + Sync
{
    fn call<'a>(&'a self, mini: &'a mut Mini<D>) -> LocalBoxFuture<'a, Result<Page<Mini<D>>>> {
        let page = (self.handler)(mini).map(Into::into);
        Box::pin(futures::future::ready(page))
    }
}

impl<D, P, F> Debug for FnHandler<D, P, F>
where F: Fn(&mut Mini<D>) -> Result<P> + Send + Sync
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("FnHandler({})",
                                 type_name::<F>()))
    }
}

// ------------------------------------------------------------------
/// A Handler from an Fn returning a future:
/// `AsyncFnHandler::new(|mini| Box::pin(async move { ... }))`.
pub struct AsyncFnHandler<D, F>
where F: for<'m> Fn(&'m mut Mini<D>) -> LocalBoxFuture<'m, Result<Page<Mini<D>>>> + Send + Sync
{
    phantom: PhantomData<fn() -> D>,
    handler: F,
}

impl<D, F> AsyncFnHandler<D, F>
where F: for<'m> Fn(&'m mut Mini<D>) -> LocalBoxFuture<'m, Result<Page<Mini<D>>>> + Send + Sync
{
    pub fn new(handler: F) -> Self {
        Self {
            phantom: PhantomData,
            handler,
        }
    }
}

impl<D, F> Handler<D> for AsyncFnHandler<D, F>
where F: for<'m> Fn(&'m mut Mini<D>) -> LocalBoxFuture<'m, Result<Page<Mini<D>>>> + Send + Sync
{
    fn call<'a>(&'a self, mini: &'a mut Mini<D>) -> LocalBoxFuture<'a, Result<Page<Mini<D>>>> {
        (self.handler)(mini)
    }
}

impl<D, F> Debug for AsyncFnHandler<D, F>
where F: for<'m> Fn(&'m mut Mini<D>) -> LocalBoxFuture<'m, Result<Page<Mini<D>>>> + Send + Sync
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("AsyncFnHandler({})",
                                 type_name::<F>()))
    }
}


/// Run `handler` with `mini` and answer: with the redirect if one was
/// requested, otherwise with the resolved page.
pub async fn handle_with_mini<D: 'static>(
    mut mini: Mini<D>,
    handler: &dyn Handler<D>,
    config: &DocumentConfig,
) -> Result<Response> {
    let page = handler.call(&mut mini).await?;
    if let Some(redirect) = mini.take_redirect() {
        return Ok(redirect_response(redirect))
    }
    html_responder(&mut mini, page.into_template(), config).await
}
