use anyhow::Context;
use tokio::net::TcpListener;

mod common;
mod config;
mod extractors;
mod logging;
mod macros;
mod middlewares;
mod models;
mod routes;
mod server;
mod services;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // configuration problems stop the process before anything is served
    let config = config::load()?;
    logging::registry_logs(config.logs.level)?;
    let addr = config.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    server::run_until_done(config, listener).await
}
