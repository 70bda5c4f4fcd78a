//! Fan-out behaviour of the per-session progress broadcaster

use std::time::Duration;

use tokio::time::timeout;
use tokio_stream::StreamExt;
use uuid::Uuid;

use intelscrape::CrawlStats;
use intelscrape::crawl_events::{
    CompletePayload, CrawlEvent, EventBusConfig, EventBusError, LogLevel, ProgressBroadcaster,
    update_stream,
};

fn complete() -> CrawlEvent {
    CrawlEvent::Complete(CompletePayload {
        success: true,
        database_save_result: None,
        error: None,
        stats: CrawlStats::default(),
    })
}

#[tokio::test]
async fn every_subscriber_sees_every_update() {
    let bus = ProgressBroadcaster::new(Uuid::new_v4());
    let mut first = bus.subscribe();
    let mut second = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    assert_eq!(bus.publish(CrawlEvent::log(LogLevel::Info, "one")), Ok(2));
    assert_eq!(bus.publish(CrawlEvent::log(LogLevel::Info, "two")), Ok(2));

    for rx in [&mut first, &mut second] {
        let a = timeout(Duration::from_millis(100), rx.recv()).await.unwrap().unwrap();
        let b = timeout(Duration::from_millis(100), rx.recv()).await.unwrap().unwrap();
        assert_eq!((a.sequence, b.sequence), (0, 1));
        assert_eq!(a.session_id, bus.session_id());
    }
    assert_eq!(bus.metrics().snapshot().peak_subscribers, 2);
}

#[tokio::test]
async fn late_subscribers_only_see_later_updates() {
    let bus = ProgressBroadcaster::new(Uuid::new_v4());
    bus.emit(CrawlEvent::log(LogLevel::Info, "before anyone listened"));

    let mut rx = bus.subscribe();
    bus.emit(CrawlEvent::log(LogLevel::Info, "after"));

    let update = rx.recv().await.unwrap();
    assert_eq!(update.sequence, 1);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn dropped_subscriber_does_not_affect_others() {
    let bus = ProgressBroadcaster::new(Uuid::new_v4());
    let mut kept = bus.subscribe();
    let dropped = bus.subscribe();
    drop(dropped);

    assert_eq!(bus.publish(CrawlEvent::log(LogLevel::Info, "x")), Ok(1));
    assert!(kept.recv().await.is_ok());
}

#[tokio::test]
async fn filtered_receiver_still_gets_terminal_update() {
    let bus = ProgressBroadcaster::new(Uuid::new_v4());
    let mut stats_only = bus.subscribe_filtered(|u| matches!(u.event, CrawlEvent::Stats(_)));

    bus.emit(CrawlEvent::log(LogLevel::Info, "ignored"));
    bus.emit(CrawlEvent::Stats(CrawlStats::default()));
    bus.emit(CrawlEvent::log(LogLevel::Warning, "ignored too"));
    bus.emit(complete());

    assert_eq!(stats_only.recv().await.unwrap().event.kind(), "stats");
    assert_eq!(stats_only.recv().await.unwrap().event.kind(), "complete");
    assert_eq!(stats_only.try_recv(), Ok(None));
}

#[tokio::test]
async fn stream_ends_after_terminal_update() {
    let bus = ProgressBroadcaster::new(Uuid::new_v4());
    let stream = update_stream(bus.subscribe());

    bus.emit(CrawlEvent::log(LogLevel::Info, "a"));
    bus.emit(complete());
    bus.emit(CrawlEvent::log(LogLevel::Info, "dropped"));

    let kinds: Vec<&'static str> = timeout(
        Duration::from_secs(1),
        stream.map(|u| u.event.kind()).collect::<Vec<_>>(),
    )
    .await
    .unwrap();
    assert_eq!(kinds, vec!["log", "complete"]);
    assert!(bus.is_finished());
}

#[tokio::test]
async fn slow_observer_lags_instead_of_blocking() {
    let bus = ProgressBroadcaster::with_config(
        Uuid::new_v4(),
        EventBusConfig {
            capacity: 2,
            enable_metrics: true,
        },
    );
    let mut slow = bus.subscribe_filtered(|_| true);
    for i in 0..5 {
        bus.emit(CrawlEvent::log(LogLevel::Debug, format!("event {i}")));
    }

    assert!(matches!(
        slow.recv().await,
        Err(EventBusError::ReceiverLagged(3))
    ));
    assert_eq!(bus.metrics().snapshot().events_published, 5);
}
