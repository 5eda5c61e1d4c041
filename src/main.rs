//! Demo server: a tiny `hello` application on the raw-socket transport.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webrail::{App, Application, Request, Response, Settings, Status, Vars, ViewError};

#[derive(Parser)]
#[command(name = "webrail")]
#[command(about = "Serve the webrail demo application", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Send failure traces to the client
    #[arg(short, long)]
    debug: bool,
}

async fn index(_: Request, _: Vars) -> Result<Response, ViewError> {
    Ok(Response::new(Status::OK)
        .header("Content-Type", "text/plain")
        .body("Hello World!"))
}

async fn greet(request: Request, vars: Vars) -> Result<Response, ViewError> {
    let greeting = request.query("greeting").unwrap_or("Hello");
    let name = vars.get("name").map(String::as_str).unwrap_or("stranger");

    Ok(Response::new(Status::OK)
        .header("Content-Type", "text/plain")
        .body(format!("{greeting}, {name}!")))
}

async fn whoami(request: Request, _: Vars) -> Result<Response, ViewError> {
    let client = match request.client() {
        Some(addr) => addr.to_string(),
        None => String::from("unknown"),
    };

    Ok(Response::new(Status::OK)
        .header("Content-Type", "text/plain")
        .body(client))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webrail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(host) = cli.host {
        settings.server_host = host;
    }
    if let Some(port) = cli.port {
        settings.server_port = port;
    }
    settings.debug |= cli.debug;
    settings.install_statics()?;

    let hello = Application::new("hello")
        .named_route("/", "index", index)
        .named_route("/hello/<name>/", "greet", greet)
        .named_route("/whoami/", "whoami", whoami);

    let app = App::builder()
        .settings(settings)
        .install_app(hello)
        .root("", "hello")
        .build()?;

    info!("{}", app.settings());

    if let Err(e) = app.run().await {
        match e.is_fatal() {
            true => error!("server stopped after a view failure"),
            false => error!(error = %e, "server failed"),
        }
        return Err(e.into());
    }

    Ok(())
}
