//! `pixxio-mcp`: pixx.io DAM tools over MCP, on stdio or streamable HTTP.

mod config;
mod http;
mod server;

use anyhow::Context as _;
use clap::Parser as _;
use config::{Cli, LogFormat, Transport};
use pixxio_tools::PixxioToolSource;
use rmcp::ServiceExt as _;
use server::PixxioServer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let settings = cli.settings();
    info!(
        transport = ?cli.transport,
        base_url = settings.base_url.as_deref().unwrap_or("<unset>"),
        api_prefix = %settings.api_prefix,
        api_key_configured = settings.api_key_configured(),
        download_dir = %settings.download_dir.display(),
        "starting pixxio-mcp"
    );
    let tools = PixxioToolSource::new(settings).context("build pixx.io client")?;

    match cli.transport {
        Transport::Stdio => serve_stdio(tools).await,
        Transport::Http => http::serve(tools, cli.bind_addr()).await,
    }
}

/// Logs always go to stderr: stdout carries the stdio transport.
fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn serve_stdio(tools: PixxioToolSource) -> anyhow::Result<()> {
    info!("serving MCP over stdio");
    let service = PixxioServer::new(tools)
        .serve(rmcp::transport::stdio())
        .await
        .context("initialize stdio session")?;
    let reason = service.waiting().await.context("stdio session")?;
    info!(?reason, "stdio session ended");
    Ok(())
}
