//! Request metrics middleware.
//!
//! Counts every request, drives the live-user simulation, and records the
//! latency once the handler is done. A handler panic is timed with status
//! "500" and then resumed untouched; turning it into a response is the job
//! of an outer layer.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::http::server::AppState;

pub async fn record_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    state.instruments.record_request(&method, &path);

    let change = state.live_users.simulate(&mut rand::thread_rng());
    state.instruments.record_user_change(change);

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            state.instruments.record_latency(
                &method,
                &path,
                response.status().as_str(),
                start.elapsed(),
            );
            response
        }
        Err(panic) => {
            state
                .instruments
                .record_latency(&method, &path, "500", start.elapsed());
            std::panic::resume_unwind(panic)
        }
    }
}
