//! Liveness endpoint for the hosting platform's probe.
//!
//! A single unauthenticated route; no domain logic lives here.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing::info;

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let app = Router::new().route("/", get(liveness));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Liveness endpoint listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn liveness() -> &'static str {
    "NexGen bot is alive"
}
