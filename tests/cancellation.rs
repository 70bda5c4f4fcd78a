//! Aborting sessions mid-flight

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockSite, ScriptedClassifier, listing, orchestrator, test_config};
use intelscrape::{CrawlEvent, CrawlPhase, CrawlUpdate};

async fn run_until_terminal(
    rx: &mut tokio::sync::broadcast::Receiver<CrawlUpdate>,
    mut on_update: impl FnMut(&CrawlUpdate),
) -> Vec<CrawlUpdate> {
    let mut seen = Vec::new();
    loop {
        let update = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("session did not finish")
            .expect("update stream closed");
        on_update(&update);
        let terminal = update.is_terminal();
        seen.push(update);
        if terminal {
            return seen;
        }
    }
}

#[tokio::test]
async fn abort_during_navigation_ends_with_cancelled_complete() {
    let site = Arc::new(
        MockSite::new()
            .page("https://slow.test/", listing("s", 3, None))
            .nav_delay(Duration::from_secs(60)),
    );
    let handle = orchestrator(&site)
        .start(vec!["https://slow.test/".into()], test_config().build().unwrap())
        .unwrap();

    let mut rx = handle.subscribe();
    let mut aborted = false;
    let updates = run_until_terminal(&mut rx, |update| {
        if let CrawlEvent::Progress(progress) = &update.event
            && progress.current_url.is_some()
            && !aborted
        {
            aborted = handle.abort();
        }
    })
    .await;
    handle.wait().await;

    assert!(aborted);
    match &updates.last().unwrap().event {
        CrawlEvent::Complete(done) => {
            assert!(!done.success);
            assert_eq!(done.error.as_deref(), Some("Cancelled by user"));
            assert!(done.database_save_result.is_none());
        }
        other => panic!("expected complete, got {other:?}"),
    }
    assert_eq!(handle.phase(), CrawlPhase::Cancelled);
    assert!(
        !updates
            .iter()
            .any(|u| matches!(u.event, CrawlEvent::DatabaseSave(_)))
    );
    assert_eq!(site.shutdowns(), 1);
}

#[tokio::test]
async fn abort_during_classification_skips_saving() {
    let site = Arc::new(MockSite::new().page("https://news.test/", listing("n", 6, None)));
    let classifier = Arc::new(ScriptedClassifier::new().delay(Duration::from_millis(200)));
    let handle = orchestrator(&site)
        .with_classifier(classifier.clone())
        .start(
            vec!["https://news.test/".into()],
            test_config()
                .enable_ai_processing(true)
                .ai_batch_size(2)
                .build()
                .unwrap(),
        )
        .unwrap();

    let mut rx = handle.subscribe();
    let updates = run_until_terminal(&mut rx, |update| {
        if matches!(update.event, CrawlEvent::Data(_)) {
            handle.abort();
        }
    })
    .await;

    assert!(classifier.calls() < 3);
    assert_eq!(handle.phase(), CrawlPhase::Cancelled);
    assert!(matches!(
        &updates.last().unwrap().event,
        CrawlEvent::Complete(done) if !done.success
    ));
}

#[tokio::test]
async fn abort_after_completion_is_a_no_op() {
    let site = Arc::new(MockSite::new().page("https://news.test/", listing("n", 2, None)));
    let handle = orchestrator(&site)
        .start(vec!["https://news.test/".into()], test_config().build().unwrap())
        .unwrap();

    let updates = common::collect(&handle).await;
    assert!(matches!(
        &updates.last().unwrap().event,
        CrawlEvent::Complete(done) if done.success
    ));
    assert!(!handle.abort());
    assert_eq!(handle.phase(), CrawlPhase::Completed);
}

#[tokio::test]
async fn repeated_abort_reports_only_the_first() {
    let site = Arc::new(
        MockSite::new()
            .page("https://slow.test/", listing("s", 1, None))
            .nav_delay(Duration::from_secs(60)),
    );
    let handle = orchestrator(&site)
        .start(vec!["https://slow.test/".into()], test_config().build().unwrap())
        .unwrap();

    assert!(handle.abort());
    assert!(!handle.abort());
    let updates = common::collect(&handle).await;
    let terminals = updates.iter().filter(|u| u.is_terminal()).count();
    assert_eq!(terminals, 1);
}
