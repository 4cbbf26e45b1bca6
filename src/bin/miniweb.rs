use std::sync::Mutex;

use anyhow::Result;
use clap::Parser as ClapParser;
use lazy_static::lazy_static;
use lazyhtml::{html, json, lazy, lazy_async, try_lazy, Template};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use miniweb::mini::{Mini, RequestInfo};
use miniweb::rouille_runner::run_server;
use miniweb::url::link;
use miniweb::util::getenv_or;
use miniweb::{AsyncFnHandler, DocumentConfig, FnHandler, Page, UrlTable};


#[derive(clap::Parser, Debug)]
/// Serve the demo pages.
struct Args {
    /// Address to listen on, e.g. "127.0.0.1:3000". Default: the
    /// LISTEN_HTTP env var, or 127.0.0.1:3000.
    #[clap(long)]
    listen: Option<String>,

    /// Include the live reload client in every page.
    #[clap(long)]
    dev: bool,
}


struct State {
    visits: u64,
}

lazy_static! {
    static ref STATE: Mutex<State> = Mutex::new(State { visits: 0 });
}

fn count_visit() -> Result<u64> {
    let mut state = STATE.lock().map_err(|_| anyhow::anyhow!("state lock poisoned"))?;
    state.visits += 1;
    Ok(state.visits)
}

/// What every page gets to see as `mini.data`.
#[derive(Debug, Serialize)]
struct Visitor {
    name: String,
    user_agent: Option<String>,
}

fn make_visitor(info: &RequestInfo) -> Result<Visitor> {
    Ok(Visitor {
        name: info.params().get("name").unwrap_or("stranger").to_string(),
        user_agent: info.header("user-agent").map(String::from),
    })
}

type M = Mini<Visitor>;


fn home(mini: &mut M) -> Result<Template<M>> {
    let greeting = format!("Hello, {}!", mini.data.name);
    let delivered = mini.deliver("visitor", &serde_json::to_value(&mini.data)?);
    Ok(html!(
        "<h1>" {greeting} "</h1>\n"
        "<p>Visits so far: " {try_lazy(|_: &mut M| count_visit())} "</p>\n"
        "<ul>"
        {["bye", "api", "old", "slow"].into_iter()
         .map(|p| html!("<li><a href=\"" {link(p, &["name"], &[])} "\">" {p} "</a></li>"))
         .collect::<Vec<Template<M>>>()}
        "</ul>\n"
        {delivered}))
}

fn bye(_mini: &mut M) -> Result<Template<M>> {
    Ok(html!(
        "<h1>Goodbye</h1>"
        {lazy(|m: &mut M| {
            let name = m.data.name.clone();
            m.head(html!("<title>Bye " {name} "</title>"));
        })}))
}

fn api(mini: &mut M) -> Result<Template<M>> {
    let visitor = serde_json::to_value(&mini.data)?;
    Ok(json(&["{\"visitor\": ", ", \"route\": ", "}"],
            vec![visitor.into(),
                 lazy(|m: &mut M| m.route().to_string())]))
}

fn old(mini: &mut M) -> Result<()> {
    mini.redirect("/", Some(301));
    Ok(())
}


fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env()
              .unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let args = Args::parse();
    let listen = match args.listen {
        Some(listen) => listen,
        None => getenv_or("LISTEN_HTTP", Some("127.0.0.1:3000"))?,
    };
    let config = if args.dev {
        DocumentConfig::dev()
    } else {
        DocumentConfig::default()
    };

    let mut table = UrlTable::with_data(make_visitor);
    table
        .set_config(config)
        .set("/", FnHandler::new(home))?
        .set("/bye", FnHandler::new(bye))?
        .set("/api", FnHandler::new(api))?
        .set("/old", FnHandler::new(old))?
        .set("/slow", AsyncFnHandler::new(|_: &mut M| Box::pin(async move {
            Ok(Page::from(html!(
                "<p>Computed later: "
                {lazy_async(|m: &mut M| Box::pin(async move {
                    Ok(m.data.user_agent.clone().unwrap_or_default())
                }))}
                "</p>")))
        })))?;

    info!("dev mode: {}", args.dev);
    run_server(&listen, table)
}
