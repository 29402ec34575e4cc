//! status-relay binary entrypoint
//! Boots the poll scheduler and the Axum HTTP server (history, health, WebSocket
//! push, metrics), and shuts both down on Ctrl-C.

use anyhow::{Context, Result};
use status_relay::config::LogFormat;
use status_relay::telemetry::Metrics;
use status_relay::{router, AppConfig, Service};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("status_relay=info,updates=info,poll=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        return;
    }
    tracing::info!("shutdown requested");
    cancel.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    let cfg = AppConfig::from_env().context("loading configuration")?;
    init_tracing(cfg.log_format);
    tracing::info!(
        providers = %cfg.providers_path.display(),
        interval_secs = cfg.poll_interval.as_secs(),
        history_limit = cfg.history_limit,
        bind = %cfg.bind_addr,
        "starting status-relay"
    );

    let metrics = Metrics::init()?;
    let service = Service::from_config(&cfg);

    let cancel = CancellationToken::new();
    let poller = service.scheduler.spawn(cancel.clone());

    let app = router(service.state).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("http server")?;

    // Server may also stop on its own; make sure no new tick starts either way.
    cancel.cancel();
    poller.await.context("poll scheduler task")?;
    tracing::info!("bye");
    Ok(())
}
