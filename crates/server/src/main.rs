use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prealert_core::{
    load_config, stream_url, validate_config, Config, KvStore, LogNotifier, Notifier,
    PollScheduler, ReleaseSource, SqliteKvStore, StreamIngest, UpstreamClient, WebhookNotifier,
    WsEventSource,
};
use prealert_server::{api::create_router, state::AppState};

/// Timeout for one webhook delivery
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("PREALERT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        upstream = %config.upstream.url,
        database = ?config.database.path,
        stream = config.stream.enabled,
        polling = config.polling.enabled,
        "Configuration loaded"
    );

    let store: Arc<dyn KvStore> = Arc::new(
        SqliteKvStore::new(&config.database.path).context("Failed to open key-value store")?,
    );

    let upstream: Arc<dyn ReleaseSource> = Arc::new(
        UpstreamClient::new(&config.upstream).context("Failed to create upstream client")?,
    );
    check_upstream(upstream.as_ref()).await;

    let notifier = build_notifier(&config)?;
    let state = Arc::new(AppState::new(
        config.clone(),
        store,
        Arc::clone(&upstream),
        notifier,
    ));

    let stream_task = if config.stream.enabled {
        let url = stream_url(&config.upstream.url, &config.stream.path);
        info!(url = %url, "Starting release stream ingest");
        let ingest = StreamIngest::new(
            Arc::new(WsEventSource::new(url)),
            state.dispatcher(),
            Duration::from_secs(config.stream.reconnect_delay_secs),
        );
        Some(ingest.spawn())
    } else {
        info!("Release stream disabled in config");
        None
    };

    let poller = if config.polling.enabled {
        let poller = PollScheduler::new(
            config.polling.clone(),
            config.upstream.page_size,
            Arc::clone(&upstream),
            state.registry().clone(),
            state.last_seen().clone(),
            state.dispatcher(),
        );
        poller.start();
        Some(poller)
    } else {
        info!("Poll scheduler disabled in config");
        None
    };

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    if let Some(poller) = poller {
        poller.stop().await;
    }
    if let Some(task) = stream_task {
        task.abort();
    }

    Ok(())
}

/// Log upstream reachability. Startup continues either way.
async fn check_upstream(upstream: &dyn ReleaseSource) {
    match upstream.health().await {
        Ok(health) if health.healthy => {
            info!(total_releases = ?health.total_releases, "Upstream API healthy");
        }
        Ok(_) => warn!("Upstream API reachable but reports no releases"),
        Err(e) => warn!(error = %e, "Upstream API health check failed"),
    }
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    match &config.notifications.webhook_url {
        Some(url) => {
            info!(mode = ?config.notifications.mode, "Delivering notifications via webhook");
            let notifier = WebhookNotifier::new(url.clone(), WEBHOOK_TIMEOUT)
                .context("Failed to create webhook notifier")?;
            Ok(Arc::new(notifier))
        }
        None => {
            info!(mode = ?config.notifications.mode, "No webhook configured, logging notifications");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
