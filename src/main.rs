//! outage-relay — binary entrypoint.
//! Starts the liveness/metrics HTTP server and the channel watch loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{info, warn};

use outage_relay::config::{Config, StateBackend};
use outage_relay::metrics::Metrics;
use outage_relay::{build_watcher, router, scheduler, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = Config::from_env()?;
    // Safe diagnostics only: never the token itself.
    info!(
        channel = %cfg.watch.channel,
        chat = %cfg.chat_id,
        token_len = cfg.bot_token.len(),
        state = match &cfg.state {
            StateBackend::Upstash { .. } => "upstash",
            StateBackend::File { .. } => "file",
        },
        interval_secs = cfg.watch.poll_interval_secs,
        strategies = ?cfg.watch.strategies,
        "config loaded"
    );

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!("metrics disabled: {e:#}");
            None
        }
    };

    let watcher = Arc::new(build_watcher(&cfg)?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watch_task = scheduler::spawn_watch_loop(
        watcher,
        Duration::from_secs(cfg.watch.poll_interval_secs),
        shutdown_rx.clone(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "liveness endpoint listening");

    let mut server_shutdown = shutdown_rx;
    let server = axum::serve(listener, router(metrics.as_ref())).with_graceful_shutdown(
        async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        },
    );
    let server_task = tokio::spawn(async move { server.await });

    tokio::signal::ctrl_c().await.context("listen for ctrl-c")?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    if let Err(e) = watch_task.await {
        warn!("watch task ended abnormally: {e}");
    }
    server_task
        .await
        .context("join http server")?
        .context("http server")?;
    Ok(())
}
