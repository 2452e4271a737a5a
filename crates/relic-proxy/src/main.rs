mod bridge;
mod config;
mod network;
mod state;

use config::ProxyConfig;
use relic_data::MappingRegistry;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(ProxyConfig::load(Path::new("config/relic-proxy.toml"))?);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_filter.clone())),
        )
        .init();

    info!(
        bind = %format!("{}:{}", config.bind_address, config.bind_port),
        upstream = ?config.upstream_address,
        "starting relic-proxy",
    );

    let registry = Arc::new(MappingRegistry::new());

    let addr = format!("{}:{}", config.bind_address, config.bind_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {}", addr);

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    tokio::select! {
        _ = accept_loop(listener, config, registry) => {
            error!("accept loop exited unexpectedly");
        }
        _ = shutdown_rx.changed() => {
            info!("shutting down");
        }
    }

    Ok(())
}

async fn accept_loop(listener: TcpListener, config: Arc<ProxyConfig>, registry: Arc<MappingRegistry>) {
    let local_listener_port = config.bind_port;
    let pending = Arc::new(AtomicUsize::new(0));

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                if pending.load(Ordering::Acquire) >= config.max_pending_connections {
                    info!(%peer, "rejecting connection, too many pending");
                    continue;
                }
                info!(%peer, "new connection");
                pending.fetch_add(1, Ordering::AcqRel);
                let config = config.clone();
                let registry = registry.clone();
                let pending = pending.clone();
                tokio::spawn(async move {
                    network::handle_connection(socket, peer, local_listener_port, config, registry).await;
                    pending.fetch_sub(1, Ordering::AcqRel);
                });
            }
            Err(err) => {
                error!(error = %err, "failed to accept connection");
            }
        }
    }
}
