use crate::config::Config;
use crate::services::SqliteDeviceStore;
use crate::{routes, state};
use anyhow::Context;
use sqlx::sqlite;
use std::net::SocketAddr;
use std::path::Path;
use tokio::{net::TcpListener, signal, task::JoinSet};
use tokio_util::sync::CancellationToken;

async fn connect_database(path: &Path) -> anyhow::Result<sqlx::SqlitePool> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory: {}", dir.display()))?;
    }
    let options = sqlite::SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = sqlx::SqlitePool::connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", path.display()))?;
    SqliteDeviceStore::migrate(&pool)
        .await
        .with_context(|| format!("Failed to migrate SQLite database: {}", path.display()))?;
    Ok(pool)
}

pub async fn run_until_done(config: Config, bind: TcpListener) -> anyhow::Result<()> {
    let shutdown_signal = CancellationToken::new();
    let path = config.database.parse_path()?;
    let pool = connect_database(&path).await?;
    tracing::info!("Using device database {}", path.display());
    let state = state::AppState::build(&config, pool);
    // axum serve
    let server = {
        let shutdown_signal = shutdown_signal.clone();
        let routes = routes::build().with_state(state);
        tokio::spawn(async move {
            axum::serve(
                bind,
                routes.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                shutdown_signal.cancelled().await;
            })
            .await
        })
    };
    let mut signals = JoinSet::new();
    // register ctrl+c signal
    {
        let shutdown_signal = shutdown_signal.clone();
        signals.spawn(async move {
            if let Err(err) = signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl+C: {}", err);
                return;
            }
            tracing::info!("Received Ctrl+C, shutting down");
            shutdown_signal.cancel();
        });
    }
    #[cfg(unix)]
    {
        let shutdown_signal = shutdown_signal.clone();
        signals.spawn(async move {
            let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(err) => {
                    tracing::warn!("Failed to listen for SIGTERM: {}", err);
                    return;
                }
            };
            sigterm.recv().await;
            tracing::info!("Received SIGTERM, shutting down");
            shutdown_signal.cancel();
        });
    }
    // resolves once the token is cancelled and in-flight requests drained
    let result = server.await;
    signals.shutdown().await;
    match result {
        Ok(r) => r.context("Server terminated unexpectedly"),
        Err(e) => anyhow::bail!("Internal error in spawn: {e}"),
    }
}
