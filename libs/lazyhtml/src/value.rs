//! Values that can be interpolated into templates, including
//! deferred computations that are only run against a context at
//! resolution time.

use std::borrow::Cow;
use std::fmt::Debug;

use anyhow::Result;
use futures::future::LocalBoxFuture;
use kstring::KString;

use crate::based::BasedHtml;
use crate::escape::{escape_html, escape_json, escape_json_str};
use crate::template::Template;


type SyncFn<C> = Box<dyn FnOnce(&mut C) -> Result<Value<C>>>;
type AsyncFn<C> = Box<dyn for<'c> FnOnce(&'c mut C) -> LocalBoxFuture<'c, Result<Value<C>>>>;

enum DeferredFn<C> {
    Sync(SyncFn<C>),
    Async(AsyncFn<C>),
}

/// A one-argument function of the context, not run yet. Can only be
/// called once.
pub struct Deferred<C>(DeferredFn<C>);

impl<C> Deferred<C> {
    pub async fn call(self, context: &mut C) -> Result<Value<C>> {
        match self.0 {
            DeferredFn::Sync(f) => f(context),
            DeferredFn::Async(f) => f(context).await,
        }
    }
}

impl<C> Debug for Deferred<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            DeferredFn::Sync(_) => f.write_str("Deferred(sync)"),
            DeferredFn::Async(_) => f.write_str("Deferred(async)"),
        }
    }
}

// These two only exist to pin down the closure signatures (closures
// only get higher-ranked signatures when passed to a function with an
// Fn bound).
fn sync_fn<C, F>(f: F) -> SyncFn<C>
where F: FnOnce(&mut C) -> Result<Value<C>> + 'static
{
    Box::new(f)
}

fn async_fn<C, F>(f: F) -> AsyncFn<C>
where F: for<'c> FnOnce(&'c mut C) -> LocalBoxFuture<'c, Result<Value<C>>> + 'static
{
    Box::new(f)
}

/// A deferred value: `f` is called with the context when the
/// enclosing template is resolved.
pub fn lazy<C, V, F>(f: F) -> Value<C>
where F: FnOnce(&mut C) -> V + 'static,
      V: Into<Value<C>>,
      C: 'static
{
    Value::Deferred(Deferred(DeferredFn::Sync(sync_fn(move |c: &mut C| Ok(f(c).into())))))
}

/// Like `lazy` but `f` may fail; the error ends resolution.
pub fn try_lazy<C, V, F>(f: F) -> Value<C>
where F: FnOnce(&mut C) -> Result<V> + 'static,
      V: Into<Value<C>>,
      C: 'static
{
    Value::Deferred(Deferred(DeferredFn::Sync(sync_fn(move |c: &mut C| Ok(f(c)?.into())))))
}

/// A deferred value computed asynchronously:
/// `lazy_async(|ctx| Box::pin(async move { ... }))`.
pub fn lazy_async<C, V, F>(f: F) -> Value<C>
where F: for<'c> FnOnce(&'c mut C) -> LocalBoxFuture<'c, Result<V>> + 'static,
      V: Into<Value<C>> + 'static,
      C: 'static
{
    Value::Deferred(Deferred(DeferredFn::Async(async_fn(move |c: &mut C| {
        let fut = f(c);
        Box::pin(async move { Ok(fut.await?.into()) })
    }))))
}


/// Anything that can be interpolated into a `Template<C>`.
#[derive(Debug)]
pub enum Value<C> {
    /// null / undefined
    Empty,
    Text(KString),
    Number(serde_json::Number),
    Bool(bool),
    /// Structured data; rendered as JSON.
    Json(serde_json::Value),
    Based(BasedHtml),
    Template(Template<C>),
    Group(Vec<Template<C>>),
    Deferred(Deferred<C>),
}

impl<C> Value<C> {
    pub fn is_scalar(&self) -> bool {
        match self {
            Value::Empty | Value::Text(_) | Value::Number(_)
                | Value::Bool(_) | Value::Json(_) => true,
            Value::Based(_) | Value::Template(_) | Value::Group(_)
                | Value::Deferred(_) => false,
        }
    }

    /// The string form of a scalar value, unescaped; `None` for
    /// non-scalars.
    pub fn scalar_text(&self) -> Option<Cow<str>> {
        Some(match self {
            Value::Empty => Cow::Borrowed(""),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Value::Json(serde_json::Value::String(s)) => Cow::Borrowed(s.as_str()),
            Value::Json(serde_json::Value::Null) => Cow::Borrowed(""),
            Value::Json(v) => Cow::Owned(escape_json(v)),
            _ => return None
        })
    }

    /// HTML-escaped text of a scalar value.
    pub fn escape_for_html(&self) -> Option<KString> {
        let text = self.scalar_text()?;
        Some(KString::from_ref(&escape_html(&text)))
    }

    /// JSON text of a scalar value (`JSON.stringify` semantics;
    /// `Empty` becomes `null`).
    pub fn escape_for_json(&self) -> Option<KString> {
        Some(KString::from_string(match self {
            Value::Empty => "null".into(),
            Value::Text(s) => escape_json_str(s),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Json(v) => escape_json(v),
            _ => return None
        }))
    }
}


impl<C> From<&str> for Value<C> {
    fn from(s: &str) -> Self {
        Value::Text(KString::from_ref(s))
    }
}

impl<C> From<&&str> for Value<C> {
    fn from(s: &&str) -> Self {
        Value::Text(KString::from_ref(*s))
    }
}

impl<C> From<String> for Value<C> {
    fn from(s: String) -> Self {
        Value::Text(KString::from_string(s))
    }
}

impl<C> From<&String> for Value<C> {
    fn from(s: &String) -> Self {
        Value::Text(KString::from_ref(s))
    }
}

impl<C> From<KString> for Value<C> {
    fn from(s: KString) -> Self {
        Value::Text(s)
    }
}

impl<C> From<&KString> for Value<C> {
    fn from(s: &KString) -> Self {
        Value::Text(s.clone())
    }
}

impl<'t, C> From<Cow<'t, str>> for Value<C> {
    fn from(s: Cow<'t, str>) -> Self {
        Value::Text(KString::from_ref(s.as_ref()))
    }
}

macro_rules! value_from_integer {
    ($($t:ty)*) => {
        $(
            impl<C> From<$t> for Value<C> {
                fn from(n: $t) -> Self {
                    Value::Number(serde_json::Number::from(n))
                }
            }
        )*
    }
}

value_from_integer!(i8 i16 i32 i64 isize u8 u16 u32 u64 usize);

impl<C> From<f64> for Value<C> {
    fn from(x: f64) -> Self {
        // JSON has no NaN or infinities
        match serde_json::Number::from_f64(x) {
            Some(n) => Value::Number(n),
            None => Value::Empty,
        }
    }
}

impl<C> From<f32> for Value<C> {
    fn from(x: f32) -> Self {
        Value::from(x as f64)
    }
}

impl<C> From<bool> for Value<C> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<C> From<()> for Value<C> {
    fn from(_: ()) -> Self {
        Value::Empty
    }
}

impl<C, T: Into<Value<C>>> From<Option<T>> for Value<C> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Empty,
        }
    }
}

impl<C> From<serde_json::Value> for Value<C> {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<C> From<BasedHtml> for Value<C> {
    fn from(b: BasedHtml) -> Self {
        Value::Based(b)
    }
}

impl<C> From<&BasedHtml> for Value<C> {
    fn from(b: &BasedHtml) -> Self {
        Value::Based(b.clone())
    }
}

impl<C> From<Template<C>> for Value<C> {
    fn from(t: Template<C>) -> Self {
        Value::Template(t)
    }
}

impl<C> From<Vec<Template<C>>> for Value<C> {
    fn from(ts: Vec<Template<C>>) -> Self {
        Value::Group(ts)
    }
}

impl<C> From<Deferred<C>> for Value<C> {
    fn from(d: Deferred<C>) -> Self {
        Value::Deferred(d)
    }
}
