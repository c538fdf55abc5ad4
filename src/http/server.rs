//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (request metrics, panic guard, request tracing)
//! - Bind server to listener
//! - Stop accepting on the shutdown broadcast and drain in-flight requests

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;

use crate::http::error::panic_response;
use crate::http::handlers;
use crate::http::middleware::record_metrics;
use crate::observability::{self, Instruments, LiveUsers, Telemetry};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub instruments: Instruments,
    pub live_users: Arc<LiveUsers>,
}

impl AppState {
    pub fn new(instruments: Instruments) -> Self {
        Self {
            instruments,
            live_users: Arc::new(LiveUsers::new()),
        }
    }
}

/// HTTP server for the demo endpoints.
pub struct DemoServer {
    router: Router,
    state: AppState,
}

impl DemoServer {
    /// Create a server whose instruments come from `telemetry`'s meter.
    pub fn new(telemetry: &Telemetry) -> Self {
        Self::with_state(AppState::new(Instruments::new(&telemetry.meter())))
    }

    pub fn with_state(state: AppState) -> Self {
        let router = Self::build_router(routes(), state.clone());
        Self { router, state }
    }

    /// Wrap `routes` in the request middleware stack.
    ///
    /// Layer order, outermost first: request id, request span, panic guard,
    /// metrics.
    pub fn build_router(routes: Router<AppState>, state: AppState) -> Router {
        let router = routes
            .layer(middleware::from_fn_with_state(state.clone(), record_metrics))
            .layer(CatchPanicLayer::custom(panic_response))
            .with_state(state);

        observability::tracing::instrument(router)
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Demo routes without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fast", get(handlers::fast))
        .route("/slow", get(handlers::slow))
        .route("/error", get(handlers::error))
        .fallback(handlers::not_found)
}
