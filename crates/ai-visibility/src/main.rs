mod http;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_visibility::config::Config;
use ai_visibility::{VisibilityOrchestrator, VisibilityScorer};
use llm_common::generate::ChatGenerator;
use llm_common::openai::OpenAiClient;

use server::VisibilityServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting ai-visibility MCP server");

    let config = Config::from_env()?;
    info!(
        base_url = %config.openai.base_url,
        model = %config.model,
        timeout_ms = config.openai.default_timeout.as_millis(),
        call_timeout_ms = config.call_timeout.map(|d| d.as_millis() as u64),
        "configuration loaded"
    );

    let client = Arc::new(OpenAiClient::new(config.openai.clone())?);
    let generator = Arc::new(ChatGenerator::new(client, config.model.clone()));
    let scorer = VisibilityScorer::new(config.scoring.clone())?;
    let orchestrator = Arc::new(
        VisibilityOrchestrator::new(generator, scorer).with_call_timeout(config.call_timeout),
    );

    if let Some(addr) = config.http_listen_addr.clone() {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if let Err(e) = http::serve(&addr, orchestrator).await {
                tracing::error!(error = %e, "HTTP endpoint stopped");
            }
        });
    }

    let server = VisibilityServer::new(orchestrator);

    if let Some(addr) = config.mcp_tcp_listen_addr {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
