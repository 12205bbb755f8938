//! Integration tests for the waiting room and its periodic admission loop.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use boxoffice_core::config::QueueConfig;
use boxoffice_entity::queue::AdmissionStatus;
use boxoffice_realtime::OutboundMessage;
use boxoffice_worker::{AdmissionTicker, PeriodicRunner};

use helpers::QueueTestApp;

fn queue_config() -> QueueConfig {
    QueueConfig {
        shard_capacity: 120,
        batch_size: 20,
        interval_ms: 2000,
        fast_path_threshold: 0,
        ready_ttl_seconds: 600,
        ..QueueConfig::default()
    }
}

async fn ready_tokens(app: &QueueTestApp, tokens: &[String]) -> Vec<bool> {
    let mut ready = Vec::with_capacity(tokens.len());
    for token in tokens {
        ready.push(app.queue.is_ready(token).await.unwrap());
    }
    ready
}

#[tokio::test(start_paused = true)]
async fn test_admission_loop_promotes_one_batch_per_interval() {
    let config = queue_config();
    let app = QueueTestApp::new(config.clone());

    let tokens: Vec<String> = (0..50).map(|i| format!("visitor-{i:02}")).collect();
    for token in &tokens {
        let ticket = app.queue.enqueue(Some(token.clone())).await.unwrap();
        assert_eq!(ticket.shard, Some(1));
        assert_eq!(ticket.status, AdmissionStatus::Waiting);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = PeriodicRunner::new(
        Arc::new(AdmissionTicker::new(Arc::clone(&app.queue))),
        config.interval(),
    );
    let handle = runner.spawn(shutdown_rx);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    let ready = ready_tokens(&app, &tokens).await;
    assert!(ready[..20].iter().all(|r| *r));
    assert!(ready[20..].iter().all(|r| !*r));

    tokio::time::sleep(Duration::from_millis(2000)).await;
    let ready = ready_tokens(&app, &tokens).await;
    assert!(ready[..40].iter().all(|r| *r));
    assert!(ready[40..].iter().all(|r| !*r));

    let stats = app.queue.stats().await.unwrap();
    assert_eq!(stats.enqueued_total, 50);
    assert_eq!(stats.waiting, 10);

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ready_flag_never_reverts_while_live() {
    let app = QueueTestApp::new(QueueConfig {
        ready_ttl_seconds: 60,
        ..queue_config()
    });
    app.queue.enqueue(Some("visitor".into())).await.unwrap();
    app.queue.tick().await.unwrap();

    for _ in 0..11 {
        assert!(app.queue.is_ready("visitor").await.unwrap());
        let again = app.queue.enqueue(Some("visitor".into())).await.unwrap();
        assert!(again.is_ready());
        tokio::time::advance(Duration::from_secs(5)).await;
    }
    assert_eq!(app.queue.stats().await.unwrap().enqueued_total, 1);
}

#[tokio::test]
async fn test_admission_is_published_in_arrival_order() {
    let app = QueueTestApp::new(queue_config());
    let mut rx = app.pubsub.subscribe("queue.admitted").await;

    for token in ["first", "second", "third"] {
        app.queue.enqueue(Some(token.into())).await.unwrap();
    }
    assert_eq!(app.queue.tick().await.unwrap(), 3);

    for expected in ["first", "second", "third"] {
        match rx.recv().await.unwrap() {
            OutboundMessage::QueueAdmitted { token, shard, .. } => {
                assert_eq!(token, expected);
                assert_eq!(shard, Some(1));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_fast_path_admits_until_threshold() {
    let app = QueueTestApp::new(QueueConfig {
        fast_path_threshold: 2,
        ..queue_config()
    });

    let first = app.queue.enqueue(None).await.unwrap();
    let second = app.queue.enqueue(None).await.unwrap();
    let third = app.queue.enqueue(None).await.unwrap();

    assert!(first.is_ready());
    assert!(second.is_ready());
    assert_eq!(third.status, AdmissionStatus::Waiting);
    assert_ne!(first.token, second.token);

    let stats = app.queue.stats().await.unwrap();
    assert_eq!(stats.admitted_live, 2);
    assert_eq!(stats.enqueued_total, 1);
}
