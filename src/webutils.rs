use std::borrow::Cow;

use anyhow::Error;
use lazyhtml::based_html;
use rouille::{Response, ResponseBody};
use tracing::error;

use crate::aresponse::{CONTENT_TYPE, HTML_CONTENT_TYPE};
use crate::mini::Redirect;


pub fn status_title(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "Error",
    }
}

fn status_desc(status: u16) -> &'static str {
    match status {
        404 => "The requested resource was not found on this server.",
        500 => "The server encountered an error and could not complete the request.",
        _ => "",
    }
}

pub fn errorpage_from_status(status: u16) -> Response {
    let title = status_title(status);
    let page = based_html!(
        "<html><head><title>" {title} "</title></head><body><h1>" {title} "</h1>"
        "<p>" {status_desc(status)} "</p></body></html>\n");
    Response {
        status_code: status,
        headers: vec![(Cow::from(CONTENT_TYPE), Cow::from(HTML_CONTENT_TYPE))],
        data: ResponseBody::from_string(page.to_string()),
        upgrade: None,
    }
}

/// Log `err` and answer with a 500 page that does not show it.
pub fn errorpage_from_error(err: Error) -> Response {
    let status = 500;
    error!("error in page (returning {status}): {err:#}");
    errorpage_from_status(status)
}

pub fn redirect_response(redirect: Redirect) -> Response {
    let Redirect { url, status } = redirect;
    match status {
        301 => Response::redirect_301(url),
        302 => Response::redirect_302(url),
        // ^ Instruct the client to do GET
        303 => Response::redirect_303(url),
        307 => Response::redirect_307(url),
        // ^ Instruct the client to do GET or POST as per original request
        308 => Response::redirect_308(url),
        _ => Response {
            status_code: status,
            headers: vec![(Cow::from("Location"), Cow::from(url))],
            data: ResponseBody::empty(),
            upgrade: None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_errorpage() {
        let r = errorpage_from_status(404);
        assert_eq!(r.status_code, 404);
        let (mut reader, _) = r.data.into_reader_and_size();
        let mut body = String::new();
        std::io::Read::read_to_string(&mut reader, &mut body).unwrap();
        assert!(body.contains("<h1>Not Found</h1>"));
    }

    #[test]
    fn t_redirect_response() {
        let r = redirect_response(Redirect { url: "/a?b=1".into(), status: 303 });
        assert_eq!(r.status_code, 303);
        assert_eq!(r.headers.iter().find(|(k, _)| k == "Location").map(|(_, v)| v.as_ref()),
                   Some("/a?b=1"));
        let r = redirect_response(Redirect { url: "/x".into(), status: 399 });
        assert_eq!(r.status_code, 399);
    }
}
