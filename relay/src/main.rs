// Feed relay entry point: watcher loop plus optional HTTP surface

use anyhow::{Context, Result};
use common::bootstrap;
use common::config::ServerConfig;
use common::telemetry;
use common::watcher::Watcher;
use tokio::net::TcpListener;

mod handlers;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = bootstrap::load_settings()?;
    telemetry::init_logging(&settings.observability)?;

    tracing::info!("Starting feed relay");
    tracing::info!(
        feed_url = %settings.feed.url,
        channel_id = %settings.discord.channel_id,
        poll_interval_seconds = settings.feed.poll_interval_seconds,
        server_enabled = settings.server.enabled,
        "Configuration loaded"
    );

    let metrics_handle = match telemetry::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics disabled");
            None
        }
    };

    let watcher = bootstrap::init_watcher(&settings)?;

    // Record the current head before the loop so startup never notifies
    watcher.initialize().await;

    let poller = watcher.clone();
    let poll_task = tokio::spawn(async move {
        if let Err(e) = poller.start().await {
            tracing::error!(error = %e, "Watcher error");
        }
    });

    if settings.server.enabled {
        let app = routes::create_router(AppState::new(watcher.clone(), metrics_handle));

        let listener = bind_listener(&settings.server).await?;
        tracing::info!(addr = %listener.local_addr()?, "Starting HTTP server");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("HTTP server stopped");
    } else {
        shutdown_signal().await;
    }

    if let Err(e) = watcher.stop().await {
        tracing::error!(error = %e, "Error during watcher shutdown");
    }
    if let Err(e) = poll_task.await {
        tracing::error!(error = %e, "Watcher task panicked");
    }

    telemetry::shutdown_tracer();
    tracing::info!("Feed relay stopped");
    Ok(())
}

/// Bind the HTTP listener; `host` may be an IP address or a resolvable name
async fn bind_listener(server: &ServerConfig) -> Result<TcpListener> {
    let host = server.host.as_str();
    TcpListener::bind((host, server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, server.port))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}
