//! Metric instruments and the simulated live-user gauge.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path
//! - `http_request_duration_seconds` (histogram): latency by method, path, status
//! - `live_users` (up/down counter): simulated concurrent users
//!
//! # Design Decisions
//! - Instruments are created once from an injected `Meter` and cloned into
//!   application state; the SDK makes them safe to update concurrently
//! - The live-user counter is updated with a compare-and-swap loop, so it
//!   never drops below zero

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use rand::Rng;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const LIVE_USERS: &str = "live_users";

/// Probability that a request brings new users.
const JOIN_PROBABILITY: f64 = 0.3;
/// Probability that users leave, given nobody joined. 2/7 of the remaining
/// 0.7 makes 0.2 overall.
const LEAVE_PROBABILITY: f64 = 2.0 / 7.0;

/// Request-level instruments shared by every handler.
#[derive(Clone)]
pub struct Instruments {
    requests: Counter<u64>,
    latency: Histogram<f64>,
    live_users: UpDownCounter<i64>,
}

impl Instruments {
    pub fn new(meter: &Meter) -> Self {
        let requests = meter
            .u64_counter(REQUESTS_TOTAL)
            .with_description("Total number of HTTP requests")
            .with_unit("1")
            .build();

        let latency = meter
            .f64_histogram(REQUEST_DURATION)
            .with_description("HTTP request latency in seconds")
            .with_unit("s")
            .build();

        let live_users = meter
            .i64_up_down_counter(LIVE_USERS)
            .with_description("Number of live users (simulated)")
            .with_unit("1")
            .build();

        Self {
            requests,
            latency,
            live_users,
        }
    }

    /// Count one inbound request.
    pub fn record_request(&self, method: &str, path: &str) {
        self.requests.add(
            1,
            &[
                KeyValue::new("method", method.to_string()),
                KeyValue::new("path", path.to_string()),
            ],
        );
    }

    /// Record how long a request took.
    pub fn record_latency(&self, method: &str, path: &str, status: &str, elapsed: Duration) {
        self.latency.record(
            elapsed.as_secs_f64(),
            &[
                KeyValue::new("method", method.to_string()),
                KeyValue::new("path", path.to_string()),
                KeyValue::new("status", status.to_string()),
            ],
        );
    }

    /// Mirror a live-user change onto the exported instrument.
    pub fn record_user_change(&self, change: UserChange) {
        let delta = change.delta();
        if delta != 0 {
            self.live_users.add(delta, &[]);
        }
    }
}

/// Outcome of one simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChange {
    Joined(i64),
    Left(i64),
    Unchanged,
}

impl UserChange {
    /// Signed change applied to the counter.
    pub fn delta(self) -> i64 {
        match self {
            UserChange::Joined(n) => n,
            UserChange::Left(n) => -n,
            UserChange::Unchanged => 0,
        }
    }
}

/// Simulated number of concurrent users.
#[derive(Debug, Default)]
pub struct LiveUsers {
    current: AtomicI64,
}

impl LiveUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> i64 {
        self.current.load(Ordering::Acquire)
    }

    /// Randomly add or remove a few users.
    ///
    /// Joins 1..=3 users with probability 0.3; otherwise, when the count is
    /// positive, removes 1..=min(2, current) users with probability 0.2
    /// overall.
    pub fn simulate<R: Rng>(&self, rng: &mut R) -> UserChange {
        if rng.gen_bool(JOIN_PROBABILITY) {
            let joined = rng.gen_range(1..=3);
            self.current.fetch_add(joined, Ordering::AcqRel);
            return UserChange::Joined(joined);
        }

        if !rng.gen_bool(LEAVE_PROBABILITY) {
            return UserChange::Unchanged;
        }

        let mut left = 0;
        let updated = self
            .current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if current <= 0 {
                    return None;
                }
                left = rng.gen_range(1..=current.min(2));
                Some(current - left)
            });

        match updated {
            Ok(_) => UserChange::Left(left),
            Err(_) => UserChange::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sequential_simulation_never_negative() {
        let users = LiveUsers::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10_000 {
            let before = users.current();
            let change = users.simulate(&mut rng);
            assert_eq!(users.current(), before + change.delta());
            assert!(users.current() >= 0);
        }
    }

    #[test]
    fn test_step_sizes_stay_in_range() {
        let users = LiveUsers::new();
        let mut rng = StdRng::seed_from_u64(42);
        let mut saw_join = false;
        let mut saw_leave = false;

        for _ in 0..5_000 {
            let before = users.current();
            match users.simulate(&mut rng) {
                UserChange::Joined(n) => {
                    saw_join = true;
                    assert!((1..=3).contains(&n));
                }
                UserChange::Left(n) => {
                    saw_leave = true;
                    assert!(n >= 1 && n <= before.min(2));
                }
                UserChange::Unchanged => assert_eq!(users.current(), before),
            }
        }

        assert!(saw_join && saw_leave);
    }

    #[test]
    fn test_empty_room_cannot_shrink() {
        let users = LiveUsers::new();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..1_000 {
            let change = users.simulate(&mut rng);
            assert!(!matches!(change, UserChange::Left(_)));
            users.current.store(0, Ordering::Release);
        }
    }

    #[test]
    fn test_concurrent_updates_stay_non_negative() {
        let users = std::sync::Arc::new(LiveUsers::new());
        let handles: Vec<_> = (0..8)
            .map(|seed| {
                let users = users.clone();
                std::thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for _ in 0..2_000 {
                        users.simulate(&mut rng);
                        assert!(users.current() >= 0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(users.current() >= 0);
    }
}
