//! Load testing for the balancer.

use std::time::{Duration, Instant};

mod common;

#[tokio::test]
async fn test_load_spreads_room_creation_evenly() {
    // 1. Setup three mock backends
    let a = common::start_mock_backend("a").await;
    let b = common::start_mock_backend("b").await;
    let c = common::start_mock_backend("c").await;

    // 2. Start the balancer
    let proxy = common::start_proxy(common::test_config(&[a, b, c])).await;

    // 3. Run load test
    let concurrency = 20;
    let requests_per_task = 15;
    let total_requests = concurrency * requests_per_task;

    let client = common::client();
    let url = proxy.url("/room");
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            let mut bodies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                let res = client.get(&url).send().await.unwrap();
                assert_eq!(res.status(), 200);
                bodies.push(res.text().await.unwrap());
                latencies.push(req_start.elapsed());
            }
            (latencies, bodies)
        }));
    }

    let mut all_latencies = Vec::new();
    let mut counts = [0usize; 3];
    for task in tasks {
        let (latencies, bodies) = task.await.unwrap();
        all_latencies.extend(latencies);
        for body in bodies {
            match body.as_str() {
                "a" => counts[0] += 1,
                "b" => counts[1] += 1,
                "c" => counts[2] += 1,
                other => panic!("unexpected body {other:?}"),
            }
        }
    }

    let duration = start.elapsed();
    all_latencies.sort();
    let p99 = all_latencies[(all_latencies.len() * 99) / 100 - 1];
    println!(
        "{} requests in {:?} ({:.2} req/s), p99 {:?}",
        total_requests,
        duration,
        total_requests as f64 / duration.as_secs_f64(),
        p99
    );

    // Every cursor value is handed out once, so the split is exact.
    assert_eq!(counts, [total_requests / 3; 3]);
    assert!(p99 < Duration::from_secs(5));
}
