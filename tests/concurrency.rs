//! `/slow` must not block unrelated requests.

use std::time::{Duration, Instant};

use telemetry_demo::DemoServer;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_slow_requests_overlap() {
    let (state, _registry, _provider) = common::metered_state();
    let (addr, shutdown) = common::spawn_server(DemoServer::with_state(state)).await;

    let client = reqwest::Client::new();
    let url = format!("http://{}/slow", addr);
    let start = Instant::now();

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            tokio::spawn(async move { client.get(&url).send().await })
        })
        .collect();

    for task in tasks {
        let response = task.await.unwrap().expect("server reachable");
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "slow response");
    }

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(
        elapsed < Duration::from_secs(5),
        "50 slow requests took {:?}",
        elapsed
    );

    shutdown.trigger();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fast_is_not_stuck_behind_slow() {
    let (state, _registry, _provider) = common::metered_state();
    let (addr, shutdown) = common::spawn_server(DemoServer::with_state(state)).await;
    let client = reqwest::Client::new();

    let slow = {
        let client = client.clone();
        let url = format!("http://{}/slow", addr);
        tokio::spawn(async move { client.get(&url).send().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let start = Instant::now();
    let response = client
        .get(format!("http://{}/fast", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(start.elapsed() < Duration::from_secs(1));

    assert_eq!(slow.await.unwrap().unwrap().status(), 200);
    shutdown.trigger();
}
