//! Turning a page template into a streamed response.

use anyhow::Result;
use lazyhtml::{html, Kind, Template, DANGERJSON_WARNING};
use rouille::{Response, ResponseBody};
use tracing::{debug, warn};

use crate::aresponse::{CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::document::{skeleton, DocumentConfig};
use crate::mini::Mini;
use crate::webutils::redirect_response;


/// Resolve `page` against `mini` and stream it. A json page is sent
/// as is with a json content type; anything else is wrapped in the
/// document skeleton with the head from `mini`, `config` or the
/// process-wide default, in that order of precedence.
///
/// Errors from deferred nodes are returned before anything is sent.
pub async fn html_responder<D: 'static>(
    mini: &mut Mini<D>,
    page: Template<Mini<D>>,
    config: &DocumentConfig,
) -> Result<Response> {
    let page = if page.kind() == Kind::DangerJson {
        warn!("dangerjson page at {:?}, substituting warning", mini.route());
        Template::warning(DANGERJSON_WARNING)
    } else {
        page
    };

    let document = if page.kind().is_json() {
        let page = page.resolve(mini).await?;
        mini.headers(vec![(CONTENT_TYPE.into(), JSON_CONTENT_TYPE.into())], false);
        page
    } else {
        // The body first: it may set the head.
        let body = page.resolve(mini).await?;
        let head = match mini.take_head() {
            Some(head) => head,
            None => html(&["", ""], vec![config.head().into()]),
        };
        let head = head.resolve(mini).await?;
        skeleton(config.reloader.as_ref(), head, body)
    };

    if let Some(redirect) = mini.take_redirect() {
        debug!("redirect from within the page at {:?}", mini.route());
        return Ok(redirect_response(redirect))
    }

    let chunks = document.into_chunks()?;
    let options = mini.take_options();
    let body = if mini.request().method().is_head() {
        ResponseBody::empty()
    } else {
        ResponseBody::from_reader(chunks.into_reader())
    };
    Ok(options.into_response(body))
}


#[cfg(test)]
pub(crate) mod tests {
    use std::io::Read;

    use lazyhtml::{based_html, dangerjson, json, lazy, BasedHtml};

    use super::*;
    use crate::mini::tests::request_info;

    pub(crate) fn body_of(response: Response) -> String {
        let (mut reader, _) = response.data.into_reader_and_size();
        let mut body = String::new();
        reader.read_to_string(&mut body).unwrap();
        body
    }

    fn header<'r>(response: &'r Response, name: &str) -> Option<&'r str> {
        response.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
    }

    fn respond(mini: &mut Mini, page: Template<Mini>, config: &DocumentConfig) -> Response {
        pollster::block_on(html_responder(mini, page, config)).unwrap()
    }

    fn config() -> DocumentConfig {
        DocumentConfig::default().with_head(BasedHtml::preserialized("<title>test</title>"))
    }

    #[test]
    fn t_html_document() {
        let mut mini = Mini::new(request_info("/"), "/", ());
        let page = lazyhtml::html!("<h1>" {"<b>x</b>"} "</h1>");
        let r = respond(&mut mini, page, &config());
        assert_eq!(r.status_code, 200);
        assert_eq!(header(&r, "Content-Type"), Some("text/html; charset=utf-8"));
        let body = body_of(r);
        assert!(body.starts_with("<!DOCTYPE html>\n<html>\n<head>\n <title>test</title>"));
        assert!(body.contains("<body>\n<h1>&lt;b&gt;x&lt;/b&gt;</h1>\n</body>"));
    }

    #[test]
    fn t_head_request_is_resolved_without_body() {
        let request = rouille::Request::fake_http("HEAD", "/", vec![], vec![]);
        let mut mini = Mini::new(crate::mini::RequestInfo::from_request(&request).unwrap(),
                                 "/", ());
        let page = lazyhtml::html!(
            "<h1>hi</h1>"
            {lazy(|m: &mut Mini| m.headers(vec![("X-Resolved".into(), "yes".into())], false))});
        let r = respond(&mut mini, page, &config());
        assert_eq!(r.status_code, 200);
        assert_eq!(header(&r, "x-resolved"), Some("yes"));
        assert_eq!(header(&r, "content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(body_of(r), "");
    }

    #[test]
    fn t_head_set_during_resolution() {
        let mut mini = Mini::new(request_info("/bye"), "/bye", ());
        let page = lazyhtml::html!(
            "<h1>Goodbye</h1>"
            {lazy(|m: &mut Mini| {
                m.head(lazyhtml::html!(" <title>" {"bye & bye"} "</title>"));
            })});
        let body = body_of(respond(&mut mini, page, &config()));
        assert!(body.contains("<title>bye &amp; bye</title>"));
        assert!(!body.contains("<title>test</title>"));
    }

    #[test]
    fn t_reloader() {
        let mut mini = Mini::new(request_info("/"), "/", ());
        let config = DocumentConfig::dev().with_head(based_html!("<title>dev</title>"));
        let body = body_of(respond(&mut mini, lazyhtml::html!("hi"), &config));
        let reload = body.find("ws://localhost:3001/reload").unwrap();
        assert!(reload < body.find("<title>dev</title>").unwrap());
    }

    #[test]
    fn t_json_page() {
        let mut mini = Mini::new(request_info("/api"), "/api", ());
        mini.headers(vec![("X-Api".into(), "1".into())], false);
        let page: Template<Mini> = json(&["{\"n\": ", "}"], vec![lazy(|_: &mut Mini| 3)]);
        let r = respond(&mut mini, page, &config());
        assert_eq!(header(&r, "content-type"), Some("application/json; charset=utf-8"));
        assert_eq!(header(&r, "x-api"), Some("1"));
        assert_eq!(body_of(r), "{\"n\": 3}");
    }

    #[test]
    fn t_dangerjson_page_is_rejected() {
        let mut mini = Mini::new(request_info("/"), "/", ());
        let page: Template<Mini> = dangerjson(&["{\"raw\": 1}"], vec![]);
        let body = body_of(respond(&mut mini, page, &config()));
        assert!(body.contains("Use json and not dangerjson"));
        assert!(!body.contains("{\"raw\": 1}"));
    }

    #[test]
    fn t_redirect_from_deferred() {
        let mut mini = Mini::new(request_info("/"), "/", ());
        let page = lazyhtml::html!(
            "<p>secret</p>" {lazy(|m: &mut Mini| m.redirect("/login", None))});
        let r = respond(&mut mini, page, &config());
        assert_eq!(r.status_code, 302);
        assert_eq!(header(&r, "location"), Some("/login"));
    }

    #[test]
    fn t_failure_is_an_error() {
        let mut mini = Mini::new(request_info("/"), "/", ());
        let page = lazyhtml::html!(
            {lazyhtml::try_lazy(|_: &mut Mini| -> Result<&'static str> {
                anyhow::bail!("backend down")
            })});
        match pollster::block_on(html_responder(&mut mini, page, &config())) {
            Ok(_) => panic!("expected the failure to propagate"),
            Err(e) => assert_eq!(e.to_string(), "backend down"),
        }
    }

    #[test]
    fn t_options_from_handler() {
        let mut mini = Mini::new(request_info("/"), "/", ());
        let page = lazyhtml::html!(
            {lazy(|m: &mut Mini| m.options(crate::aresponse::ResponseOptions::new(
                418, vec![("Content-Type".into(), "text/plain".into())])))}
            "teapot");
        let r = respond(&mut mini, page, &config());
        assert_eq!(r.status_code, 418);
        assert_eq!(header(&r, "Content-Type"), Some("text/plain"));
    }
}
