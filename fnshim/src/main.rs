//! fnshim - serverless function shim for a Django project
//!
//! Each invocation launches `manage.py runserver` and answers with whatever
//! the server printed during a short sampling window. The function can be
//! hosted locally over HTTP, invoked once from the command line, or run
//! under the Lambda runtime.

mod config;
mod router;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use fnshim_core::{ErrorCode, HostError, RequestId};
use fnshim_function::{FunctionHandler, FunctionState, InvocationContext, InvocationEvent};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fnshim")]
#[command(about = "Serverless function shim for the Django development server", long_about = None)]
struct Args {
    /// Configuration file (defaults to an optional ./fnshim.toml)
    #[arg(long, global = true, env = "FNSHIM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "FNSHIM_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host the function over HTTP under /.netlify/functions (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "FNSHIM_PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "FNSHIM_HOST")]
        host: Option<String>,
    },

    /// Invoke the function once and print the response JSON
    Invoke {
        /// Event JSON file; reads stdin when omitted
        #[arg(long)]
        event: Option<PathBuf>,
    },

    /// Run the function under the Lambda Runtime API
    Lambda,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the response for `invoke`
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "fnshim={level},fnshim_function={level},tower_http=debug",
                    level = args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::load(args.config.as_deref())?;
    let handler = Arc::new(FunctionHandler::new(config.function));

    info!(
        function = %handler.name(),
        interpreter = %handler.config().interpreter_path().display(),
        entry_script = %handler.config().entry_script_path().display(),
        bind_address = %handler.config().bind_address,
        child_policy = handler.config().child_policy.as_str(),
        "Configured function"
    );

    match args.command.unwrap_or(Command::Serve {
        port: None,
        host: None,
    }) {
        Command::Serve { port, host } => {
            let host = host.unwrap_or(config.server.host);
            let port = port.unwrap_or(config.server.port);
            serve(handler, &host, port).await
        }
        Command::Invoke { event } => invoke(&handler, event.as_deref()).await,
        Command::Lambda => fnshim_function::runtime::run(handler)
            .await
            .map_err(|e| anyhow::anyhow!(e)),
    }
}

async fn serve(handler: Arc<FunctionHandler>, host: &str, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(FunctionState::new(handler));
    let app = router::create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn invoke(handler: &FunctionHandler, event_path: Option<&Path>) -> anyhow::Result<()> {
    let input = match event_path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading event from {}", path.display()))?,
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("reading event from stdin")?;
            input
        }
    };

    let request_id = RequestId::new();
    let event = InvocationEvent::from_json(&input).map_err(|e| {
        HostError::new(ErrorCode::InvalidRequestContent, e.to_string())
            .with_request_id(request_id.clone())
    })?;

    let context = InvocationContext::local(handler.name(), &request_id, 10_000);
    let response = handler.handle(event, context).await;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
