//! End-to-end behavior of registration, dispatch and health checking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use loadbalancer::ProxyConfig;
use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn test_register_then_round_robin() {
    let b1 = common::start_named_backend("b1").await;
    let b2 = common::start_named_backend("b2").await;
    let balancer = common::start_balancer(common::quiet_config()).await;
    let client = common::client();

    assert_eq!(common::register(&client, &balancer, b1).await, StatusCode::OK);
    assert_eq!(common::register(&client, &balancer, b2).await, StatusCode::OK);
    assert_eq!(balancer.registry.len(), 2);

    let mut bodies = Vec::new();
    for _ in 0..4 {
        let res = client.get(balancer.url("/hello")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        bodies.push(res.text().await.unwrap());
    }
    assert_eq!(bodies, ["b1", "b2", "b1", "b2"]);
}

#[tokio::test]
async fn test_no_backends_is_generic_500() {
    let balancer = common::start_balancer(common::quiet_config()).await;
    let res = common::client().get(balancer.url("/hello")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "Server error");
}

#[tokio::test]
async fn test_registration_errors() {
    let balancer = common::start_balancer(common::quiet_config()).await;
    let client = common::client();

    let res = client
        .post(balancer.url("/register"))
        .body("{\"serverURL\":")
        .send()
        .await
        .unwrap();
    assert_ne!(res.status(), StatusCode::OK);

    let res = client.get(balancer.url("/register")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(balancer.registry.is_empty());

    let res = client
        .post(balancer.url("/register"))
        .body(r#"{"serverURL":"http://x"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(balancer.registry.len(), 1);
}

#[tokio::test]
async fn test_upstream_failures_leave_health_to_monitor() {
    let failing = common::start_programmable_backend(|_| async { (503, "busy".to_string()) }).await;
    let closed = common::closed_addr().await;
    let balancer = common::start_balancer(common::quiet_config()).await;
    let client = common::client();

    common::register(&client, &balancer, failing).await;
    common::register(&client, &balancer, closed).await;

    for _ in 0..2 {
        let res = client.get(balancer.url("/hello")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.text().await.unwrap(), "Server error");
    }

    for backend in balancer.registry.snapshot() {
        let state = backend.state();
        assert!(!state.is_dead, "{} was demoted by the dispatcher", backend.url());
        assert_eq!(state.revive_attempts, 0);
    }
}

#[tokio::test]
async fn test_successful_proxy_promotes_backend() {
    let slow = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        (200, "slow".to_string())
    })
    .await;
    let balancer = common::start_balancer(common::quiet_config()).await;
    let client = common::client();
    common::register(&client, &balancer, slow).await;
    let backend = balancer.registry.snapshot().remove(0);

    let url = balancer.url("/hello");
    let in_flight = tokio::spawn({
        let client = client.clone();
        async move { client.get(url).send().await }
    });

    // The monitor's view changes while the request is in flight.
    tokio::time::sleep(Duration::from_millis(100)).await;
    backend.record_failure(3);
    assert!(backend.is_dead());

    let res = in_flight.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "slow");

    let state = backend.state();
    assert!(!state.is_dead);
    assert_eq!(state.revive_attempts, 0);
}

#[tokio::test]
async fn test_upstream_timeout() {
    let hanging = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, "late".to_string())
    })
    .await;
    let mut config = common::quiet_config();
    config.proxy.upstream_timeout_secs = 1;
    let balancer = common::start_balancer(config).await;
    let client = common::client();
    common::register(&client, &balancer, hanging).await;

    let start = Instant::now();
    let res = client.get(balancer.url("/hello")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_health_check_eviction() {
    let good = common::start_named_backend("good").await;
    let bad = common::start_programmable_backend(|path| async move {
        match path.as_str() {
            "/health" => (500, "dead".to_string()),
            _ => (200, "bad".to_string()),
        }
    })
    .await;

    let mut config = ProxyConfig::default();
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    config.health_check.max_tries = 3;
    let balancer = common::start_balancer(config).await;
    let client = common::client();
    common::register(&client, &balancer, good).await;
    common::register(&client, &balancer, bad).await;

    // Ticks at ~1s, ~2s, ~3s; the third failure evicts.
    tokio::time::sleep(Duration::from_millis(3800)).await;
    assert_eq!(balancer.registry.len(), 1);

    for _ in 0..4 {
        let res = client.get(balancer.url("/hello")).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), "good");
    }
}

#[tokio::test]
async fn test_dead_backend_revives() {
    let healthy = Arc::new(AtomicBool::new(false));
    let flag = healthy.clone();
    let backend_addr = common::start_programmable_backend(move |path| {
        let flag = flag.clone();
        async move {
            match path.as_str() {
                "/health" if flag.load(Ordering::SeqCst) => (200, common::HEALTHY.to_string()),
                "/health" => (503, "down".to_string()),
                _ => (200, "back".to_string()),
            }
        }
    })
    .await;

    let mut config = ProxyConfig::default();
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    let balancer = common::start_balancer(config).await;
    let client = common::client();
    common::register(&client, &balancer, backend_addr).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let backend = balancer.registry.snapshot().remove(0);
    assert!(backend.is_dead());
    let res = client.get(balancer.url("/hello")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let state = backend.state();
    assert!(!state.is_dead);
    assert_eq!(state.revive_attempts, 0);
    let res = client.get(balancer.url("/hello")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "back");
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let balancer = common::start_balancer(ProxyConfig::default()).await;
    let url = balancer.url("/hello");
    drop(balancer);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(common::client().get(url).send().await.is_err());
}
