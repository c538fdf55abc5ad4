//! Prometheus scrape endpoint for the pull profile.
//!
//! Serves `GET /metrics` on its own listener. Each scrape gathers the
//! registry synchronously, which in turn collects the current state of the
//! OpenTelemetry instruments through the Prometheus reader.

use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Background scrape server.
pub struct ScrapeServer {
    local_addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ScrapeServer {
    /// Bind `addr` and start serving `registry` in the background.
    ///
    /// Binding happens before this returns, so a busy port is reported to
    /// the caller instead of being logged from the background task.
    pub async fn start(
        addr: SocketAddr,
        registry: Registry,
        mut shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let app = router(registry);
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Metrics endpoint failed");
            }
        });

        Ok(Self { local_addr, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop serving without waiting for the shutdown broadcast.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Router exposing the registry at `/metrics`.
pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}

async fn metrics_handler(State(registry): State<Registry>) -> Response {
    match render(&registry) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

/// Encode the current registry snapshot in the text exposition format.
pub fn render(registry: &Registry) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
