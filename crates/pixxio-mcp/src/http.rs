//! Streamable HTTP transport: `/mcp` (rmcp, stateful sessions) and `/health`.

use crate::server::PixxioServer;
use anyhow::Context as _;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use pixxio_tools::{PixxioSettings, PixxioToolSource};
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::{StreamableHttpServerConfig, StreamableHttpService};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    api_key_configured: bool,
    base_url: Option<String>,
}

impl HealthReport {
    fn from_settings(settings: &PixxioSettings) -> Self {
        Self {
            status: "ok",
            service: "pixxio-mcp",
            version: env!("CARGO_PKG_VERSION"),
            api_key_configured: settings.api_key_configured(),
            base_url: settings.base_url.clone(),
        }
    }
}

async fn health(State(report): State<Arc<HealthReport>>) -> Json<HealthReport> {
    Json((*report).clone())
}

/// Build the HTTP app. Cancelling `shutdown` terminates all MCP sessions.
pub fn router(tools: PixxioToolSource, shutdown: CancellationToken) -> Router {
    let report = Arc::new(HealthReport::from_settings(tools.settings()));
    let mcp = StreamableHttpService::new(
        move || Ok(PixxioServer::new(tools.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            cancellation_token: shutdown,
            ..Default::default()
        },
    );

    Router::new()
        .route("/health", get(health))
        .with_state(report)
        .nest_service("/mcp", mcp)
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(tools: PixxioToolSource, addr: SocketAddr) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let app = router(tools, shutdown.child_token());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "serving MCP over streamable HTTP at /mcp");

    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                signal.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("serve HTTP")?;
    info!("server stopped");
    Ok(())
}
