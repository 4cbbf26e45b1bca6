use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use rouille::{Request, Response, Server};
use tracing::info;

use crate::url::UrlTable;


/// Make a handler for Rouille's `Server`, dispatching to `table` and
/// logging one line per request.
pub fn server_handler<D: 'static>(table: Arc<UrlTable<D>>)
                                  -> impl Fn(&Request) -> Response + Send + Sync + 'static
{
    move |request: &Request| -> Response {
        let start = Instant::now();
        let response = table.respond(request);
        info!("{} {} {} {:?}",
              request.method(),
              request.raw_url(),
              response.status_code,
              start.elapsed());
        response
    }
}

/// Serve `table` on `listen_addr` (e.g. "127.0.0.1:3000"), one
/// thread per connection as Rouille does it. Does not return unless
/// the server can't be started.
pub fn run_server<D: 'static>(listen_addr: &str, table: UrlTable<D>) -> Result<()> {
    let server = Server::new(listen_addr, server_handler(Arc::new(table)))
        .map_err(|e| anyhow!("starting server on {listen_addr:?}: {e}"))?;
    info!("listening on http://{}", server.server_addr());
    server.run();
    Ok(())
}

/// Like `run_server` but in a new thread named `thread_name`.
pub fn spawn_server<D: 'static>(
    thread_name: &str,
    listen_addr: String,
    table: UrlTable<D>,
) -> Result<JoinHandle<Result<()>>> {
    Ok(thread::Builder::new().name(thread_name.into()).spawn(
        move || run_server(&listen_addr, table))?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FnHandler;
    use crate::mini::Mini;

    #[test]
    fn t_server_handler() -> Result<()> {
        let mut table = UrlTable::new();
        table.set("/", FnHandler::new(|_: &mut Mini| Ok("hello")))?;
        let handler = server_handler(Arc::new(table));
        let r = handler(&Request::fake_http("GET", "/", vec![], vec![]));
        assert_eq!(r.status_code, 200);
        let r = handler(&Request::fake_http("GET", "/nope", vec![], vec![]));
        assert_eq!(r.status_code, 404);
        Ok(())
    }
}
