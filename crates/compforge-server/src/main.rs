use std::net::{IpAddr, SocketAddr};

use anyhow::Context as _;
use clap::Parser;
use compforge_core::observability;
use compforge_server::config::{self, ServerConfig};
use compforge_server::{AppState, app};

#[derive(Debug, Parser)]
#[command(name = "compforge-server", about = "CompForge component generation API")]
struct Cli {
    /// Address to listen on.
    #[arg(long)]
    bind: Option<IpAddr>,
    /// Port to listen on. Defaults to `PORT` or 5000.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init();
    observability::init_observability();
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = cli.bind {
        config = config.bind(bind);
    }
    if let Some(port) = cli.port {
        config = config.port(port);
    }

    let state = AppState::from_config(&config)?;
    let addr = SocketAddr::new(config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        model = %state.generation.options().model,
        "compforge server listening"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
