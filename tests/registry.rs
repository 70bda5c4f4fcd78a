//! Per-client session bookkeeping

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockSite, collect, listing, orchestrator, test_config};
use intelscrape::{CrawlPhase, SessionRegistry};

fn slow_site() -> Arc<MockSite> {
    Arc::new(
        MockSite::new()
            .page("https://slow.test/", listing("s", 2, None))
            .page("https://fast.test/", listing("f", 2, None))
            .nav_delay(Duration::from_secs(60)),
    )
}

#[tokio::test]
async fn new_start_replaces_and_aborts_previous_session() {
    let site = slow_site();
    let registry = SessionRegistry::new(orchestrator(&site));

    let first = registry
        .start("client", vec!["https://slow.test/".into()], test_config().build().unwrap())
        .await
        .unwrap();
    let second = registry
        .start("client", vec!["https://slow.test/".into()], test_config().build().unwrap())
        .await
        .unwrap();

    assert_ne!(first.id(), second.id());
    collect(&first).await;
    assert_eq!(first.phase(), CrawlPhase::Cancelled);
    assert_eq!(registry.get("client").await.unwrap().id(), second.id());

    registry.shutdown().await;
    assert_eq!(second.phase(), CrawlPhase::Cancelled);
}

#[tokio::test]
async fn invalid_restart_keeps_running_session() {
    let site = slow_site();
    let registry = SessionRegistry::new(orchestrator(&site));

    let running = registry
        .start("client", vec!["https://slow.test/".into()], test_config().build().unwrap())
        .await
        .unwrap();
    assert!(
        registry
            .start("client", Vec::new(), test_config().build().unwrap())
            .await
            .is_err()
    );

    assert!(!running.is_terminal());
    assert_eq!(registry.list_active().await, vec!["client"]);
    registry.shutdown().await;
}

#[tokio::test]
async fn cancel_and_disconnect() {
    let site = slow_site();
    let registry = SessionRegistry::new(orchestrator(&site));
    assert!(!registry.cancel("nobody").await);
    assert!(registry.disconnect("nobody").await.is_none());

    let a = registry
        .start("a", vec!["https://slow.test/".into()], test_config().build().unwrap())
        .await
        .unwrap();
    registry
        .start("b", vec!["https://slow.test/".into()], test_config().build().unwrap())
        .await
        .unwrap();
    assert_eq!(registry.list_active().await, vec!["a", "b"]);

    assert!(registry.cancel("a").await);
    assert!(!registry.cancel("a").await);
    collect(&a).await;
    assert_eq!(registry.list_active().await, vec!["b"]);
    assert!(registry.snapshot("a").await.is_some());

    let b = registry.disconnect("b").await.expect("b was registered");
    b.wait().await;
    assert_eq!(b.phase(), CrawlPhase::Cancelled);
    assert!(registry.get("b").await.is_none());
    assert!(registry.subscribe("b").await.is_none());
    assert!(!registry.clear_screenshots("b").await);
    assert!(registry.clear_screenshots("a").await);

    registry.shutdown().await;
}

#[tokio::test]
async fn cleanup_drops_only_finished_sessions_past_retention() {
    let fast = Arc::new(MockSite::new().page("https://fast.test/", listing("f", 2, None)));
    let registry = SessionRegistry::with_retention(
        orchestrator(&fast),
        Duration::ZERO,
        Duration::from_secs(3600),
    );

    let done = registry
        .start("done", vec!["https://fast.test/".into()], test_config().build().unwrap())
        .await
        .unwrap();
    collect(&done).await;
    assert!(done.is_terminal());

    assert_eq!(registry.cleanup_expired().await, 1);
    assert!(registry.get("done").await.is_none());
    assert_eq!(registry.cleanup_expired().await, 0);
}

#[tokio::test]
async fn cleanup_keeps_recent_sessions() {
    let fast = Arc::new(MockSite::new().page("https://fast.test/", listing("f", 2, None)));
    let registry = SessionRegistry::with_retention(
        orchestrator(&fast),
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    );

    let done = registry
        .start("done", vec!["https://fast.test/".into()], test_config().build().unwrap())
        .await
        .unwrap();
    collect(&done).await;

    assert_eq!(registry.cleanup_expired().await, 0);
    assert!(registry.get("done").await.is_some());
}
