// Keepalive HTTP endpoint.
//
// A single static route so external uptime monitors have something to ping.
// It is not an API.

use axum::{routing::get, Router};
use rand::Rng;
use tokio::net::TcpListener;

pub const ALIVE_TEXT: &str = "Бот запущен!";

/// Port range used when no port is configured.
const RANDOM_PORT_RANGE: std::ops::RangeInclusive<u16> = 2000..=9000;

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    ALIVE_TEXT
}

/// The configured port, or a random one from `2000..=9000`.
pub fn pick_port(configured: Option<u16>) -> u16 {
    configured.unwrap_or_else(|| rand::thread_rng().gen_range(RANDOM_PORT_RANGE))
}

pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(("0.0.0.0", port)).await
}

pub async fn serve(listener: TcpListener) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Server running on port {}", addr.port());
    }
    axum::serve(listener, router()).await?;
    Ok(())
}
