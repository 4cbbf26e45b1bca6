//! The html document around a page, and the configuration that goes
//! into it.

use std::sync::{Arc, Mutex};

use lazy_static::lazy_static;
use lazyhtml::{based_html, common_head, css_reset, html, standard_dev_reloader,
               BasedHtml, Template};


/// Stores the process-wide default head. Readers get the `Arc` that
/// is current at the time; `set` does not disturb them.
struct HeadSwap {
    current: Mutex<Arc<BasedHtml>>,
}

impl HeadSwap {
    fn get(&self) -> Arc<BasedHtml> {
        match self.current.lock() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn set(&self, head: Arc<BasedHtml>) {
        match self.current.lock() {
            Ok(mut guard) => *guard = head,
            Err(poisoned) => *poisoned.into_inner() = head,
        }
    }
}

/// The head used when nothing else is configured.
pub fn initial_head() -> BasedHtml {
    based_html!("\n  <title>mini-next</title>\n  " {common_head()} " " {css_reset()} "\n")
}

lazy_static! {
    static ref DEFAULT_HEAD: HeadSwap = HeadSwap {
        current: Mutex::new(Arc::new(initial_head()))
    };
}

/// Set the default head for all pages served from now on. Can still
/// be overridden per table (`DocumentConfig::head`) and per page
/// (`Mini::head`).
pub fn set_default_head(head: BasedHtml) {
    DEFAULT_HEAD.set(Arc::new(head));
}

pub fn default_head() -> Arc<BasedHtml> {
    DEFAULT_HEAD.get()
}


/// Document settings for all pages of a `UrlTable`.
#[derive(Debug, Clone, Default)]
pub struct DocumentConfig {
    /// Put in front of the head, e.g. `standard_dev_reloader()`.
    pub reloader: Option<BasedHtml>,
    /// Overrides the process-wide default head.
    pub head: Option<BasedHtml>,
}

impl DocumentConfig {
    /// With the live reload client.
    pub fn dev() -> Self {
        DocumentConfig {
            reloader: Some(standard_dev_reloader()),
            head: None,
        }
    }

    pub fn with_head(mut self, head: BasedHtml) -> Self {
        self.head = Some(head);
        self
    }

    /// The head for pages that do not set their own.
    pub fn head(&self) -> BasedHtml {
        match &self.head {
            Some(head) => head.clone(),
            None => (*default_head()).clone(),
        }
    }
}


/// Wrap `body` and `head` in the html document skeleton.
pub fn skeleton<C>(reloader: Option<&BasedHtml>, head: Template<C>, body: Template<C>)
                   -> Template<C> {
    html(&["<!DOCTYPE html>\n<html>\n<head>\n",
           " ",
           "\n</head>\n<body>\n",
           "\n</body>\n</html>\n"],
         vec![reloader.cloned().into(), head.into(), body.into()])
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_default_head() {
        let head = default_head();
        assert!(head.as_str().contains("<title>mini-next</title>"));
        assert!(head.as_str().contains("width=device-width"));
        assert!(head.as_str().contains("box-sizing: border-box;"));

        let config = DocumentConfig::default();
        set_default_head(based_html!("<title>" {"a & b"} "</title>"));
        assert_eq!(config.head().as_str(), "<title>a &amp; b</title>");
        assert_eq!(config.clone().with_head(BasedHtml::preserialized("<title>t</title>"))
                   .head().as_str(),
                   "<title>t</title>");
        set_default_head(initial_head());
        assert_eq!(default_head().as_str(), initial_head().as_str());
    }

    #[test]
    fn t_skeleton() {
        let t: Template<()> = skeleton(None,
                                       html(&["<title>x</title>"], vec![]),
                                       html(&["<p>", "</p>"], vec!["<hi>".into()]));
        assert_eq!(t.render().unwrap(),
                   "<!DOCTYPE html>\n<html>\n<head>\n <title>x</title>\n</head>\n\
                    <body>\n<p>&lt;hi&gt;</p>\n</body>\n</html>\n");
        let reloader = DocumentConfig::dev().reloader;
        let t: Template<()> = skeleton(reloader.as_ref(), Template::empty(lazyhtml::Kind::Html),
                                       Template::empty(lazyhtml::Kind::Html));
        assert!(t.render().unwrap().contains("ws://localhost:3001/reload"));
    }
}
