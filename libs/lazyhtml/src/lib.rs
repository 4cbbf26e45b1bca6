//! Lazy, context-aware html/json templates.
//!
//! A template is built from fixed text and interpolated values. The
//! values are escaped for the kind of the template (html or json) at
//! construction; values that are functions of a context (`lazy`,
//! `lazy_async`) are only run when the template is resolved with
//! that context. The resolved tree can then be streamed as chunks.
//!
//! ```
//! use lazyhtml::{html, lazy, Template};
//!
//! struct Ctx { user: String }
//!
//! let page: Template<Ctx> = html!(
//!     "<h1>Hello " {lazy(|c: &mut Ctx| c.user.clone())} "</h1>");
//! let mut ctx = Ctx { user: "<b>bob</b>".into() };
//! let page = pollster::block_on(page.resolve(&mut ctx)).unwrap();
//! assert_eq!(page.render().unwrap(), "<h1>Hello &lt;b&gt;bob&lt;/b&gt;</h1>");
//! ```

pub mod escape;
pub mod based;
pub mod value;
pub mod template;
pub mod resolve;
pub mod flat;
pub mod fragments;

pub use based::{based_html, BasedBuilder, BasedHtml, BasedValue};
pub use escape::{escape_html, escape_json, escape_json_str};
pub use flat::{ChunkReader, Chunks, UnresolvedTemplate, UNBOUNDED};
pub use fragments::{common_head, css_reset, deliver, standard_dev_reloader};
pub use template::{css, dangerjson, html, json, Kind, Node, Template, TemplateBuilder,
                   DANGERJSON_WARNING, JSON_IN_HTML_WARNING};
pub use value::{lazy, lazy_async, try_lazy, Deferred, Value};


#[doc(hidden)]
#[macro_export]
macro_rules! __template_parts {
    ($b:ident;) => {};
    ($b:ident; $lit:literal $($rest:tt)*) => {
        $b.static_literal($lit);
        $crate::__template_parts!($b; $($rest)*);
    };
    ($b:ident; {$($v:tt)*} $($rest:tt)*) => {
        $b.value($($v)*);
        $crate::__template_parts!($b; $($rest)*);
    };
}

/// Html template from string literals and `{expression}` values:
/// `html!("<p>" {name} "</p>")`.
#[macro_export]
macro_rules! html {
    ($($part:tt)*) => {{
        let mut builder = $crate::TemplateBuilder::new($crate::Kind::Html);
        $crate::__template_parts!(builder; $($part)*);
        builder.finish()
    }};
}

/// Same as `html!`.
#[macro_export]
macro_rules! css {
    ($($part:tt)*) => {
        $crate::html!($($part)*)
    };
}

#[macro_export]
macro_rules! json {
    ($($part:tt)*) => {{
        let mut builder = $crate::TemplateBuilder::new($crate::Kind::Json);
        $crate::__template_parts!(builder; $($part)*);
        builder.finish()
    }};
}

#[macro_export]
macro_rules! dangerjson {
    ($($part:tt)*) => {{
        let mut builder = $crate::TemplateBuilder::new($crate::Kind::DangerJson);
        $crate::__template_parts!(builder; $($part)*);
        builder.finish()
    }};
}

/// `BasedHtml` from string literals and `{expression}` values, which
/// are escaped right away.
#[macro_export]
macro_rules! based_html {
    ($($part:tt)*) => {{
        let mut builder = $crate::BasedBuilder::new();
        $crate::__template_parts!(builder; $($part)*);
        builder.finish()
    }};
}
