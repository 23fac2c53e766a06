//! Collection, single-key and index watches

use std::sync::Arc;

use strata_collections::{EventType, WatchEvent};
use tokio_util::sync::CancellationToken;

use crate::common::*;

#[tokio::test]
async fn watch_delivers_snapshot_then_changes() {
    let fx = Fixture::new();
    fx.put("a", &job("queued"));
    fx.put("b", &job("running"));

    let mut stream = fx.jobs.read_only(CancellationToken::new()).watch().await;
    assert_eq!(describe(&next_event(&mut stream).await.unwrap()), ("put", "a".into()));
    assert_eq!(describe(&next_event(&mut stream).await.unwrap()), ("put", "b".into()));

    fx.put("c", &job("queued"));
    fx.delete("a");
    assert_eq!(describe(&next_event(&mut stream).await.unwrap()), ("put", "c".into()));
    assert_eq!(describe(&next_event(&mut stream).await.unwrap()), ("delete", "a".into()));
    assert!(stream.try_recv().is_none());
}

#[tokio::test]
async fn watch_ignores_index_entries() {
    let fx = Fixture::new();
    let mut stream = fx.jobs.read_only(CancellationToken::new()).watch().await;

    fx.put("j1", &job("running"));
    fx.put("j1", &job("done"));

    for expected in [job("running"), job("done")] {
        match next_event(&mut stream).await {
            Some(WatchEvent::Put { key, record, .. }) => {
                assert_eq!(key, "j1");
                assert_eq!(record, expected);
            }
            other => panic!("expected put of j1, got {other:?}"),
        }
    }
    assert!(stream.try_recv().is_none());
}

#[tokio::test]
async fn watch_one_starts_with_current_value() {
    let fx = Fixture::new();
    fx.put("j1", &job("queued"));
    fx.put("j10", &job("queued"));

    let mut stream = fx
        .jobs
        .read_only(CancellationToken::new())
        .watch_one("j1")
        .await;
    match next_event(&mut stream).await {
        Some(WatchEvent::Put { key, record, revision }) => {
            assert_eq!(key, "j1");
            assert_eq!(record, job("queued"));
            assert_eq!(revision, fx.store.mod_revision("jobs/j1"));
        }
        other => panic!("expected snapshot put, got {other:?}"),
    }

    fx.put("j10", &job("running"));
    fx.put("j1", &job("running"));
    let event = next_event(&mut stream).await.unwrap();
    assert_eq!(describe(&event), ("put", "j1".into()));
}

#[tokio::test]
async fn watch_one_on_absent_key_starts_empty() {
    let fx = Fixture::new();
    let mut stream = fx
        .jobs
        .read_only(CancellationToken::new())
        .watch_one("j1")
        .await;
    assert!(stream.try_recv().is_none());

    fx.create("j1", &job("queued"));
    assert_eq!(describe(&next_event(&mut stream).await.unwrap()), ("put", "j1".into()));
}

#[tokio::test]
async fn index_watch_follows_value_membership() {
    let fx = Fixture::new();
    fx.put("old", &job("running"));

    let mut stream = fx
        .jobs
        .read_only(CancellationToken::new())
        .watch_by_index("State", "running")
        .await;
    match next_event(&mut stream).await {
        Some(WatchEvent::Put { key, record, .. }) => {
            assert_eq!(key, "old");
            assert_eq!(record, job("running"));
        }
        other => panic!("expected snapshot put, got {other:?}"),
    }

    fx.put("j1", &job("queued"));
    fx.put("j1", &job("running"));
    fx.put("j1", &job("done"));

    let entered = next_event(&mut stream).await.unwrap();
    assert_eq!(describe(&entered), ("put", "j1".into()));
    let left = next_event(&mut stream).await.unwrap();
    assert_eq!(left.event_type(), EventType::Delete);
    assert_eq!(left.key(), Some("j1"));
}

#[tokio::test]
async fn index_watch_sees_one_put_for_unchanged_value() {
    let fx = Fixture::new();
    let mut stream = fx
        .jobs
        .read_only(CancellationToken::new())
        .watch_by_index("State", "running")
        .await;

    fx.put("j1", &job("running"));
    fx.put(
        "j1",
        &Job {
            state: "running".into(),
            attempts: 1,
        },
    );
    assert_eq!(describe(&next_event(&mut stream).await.unwrap()), ("put", "j1".into()));

    // Any put for the rewrite would be queued ahead of the delete
    fx.delete("j1");
    assert_eq!(describe(&next_event(&mut stream).await.unwrap()), ("delete", "j1".into()));
    assert!(stream.try_recv().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn index_watch_survives_create_delete_races() {
    const ROUNDS: usize = 50;

    let fx = Arc::new(Fixture::new());
    let mut stream = fx
        .jobs
        .read_only(CancellationToken::new())
        .watch_by_index("State", "running")
        .await;

    let writer = {
        let fx = Arc::clone(&fx);
        tokio::task::spawn_blocking(move || {
            for i in 0..ROUNDS {
                let key = format!("j{i}");
                fx.create(&key, &job("running"));
                fx.delete(&key);
            }
        })
    };

    for i in 0..ROUNDS {
        let key = format!("j{i}");
        loop {
            match next_event(&mut stream).await {
                Some(WatchEvent::Put {
                    key: put_key,
                    record,
                    ..
                }) => {
                    assert_eq!(put_key, key, "put out of order");
                    assert_eq!(record, job("running"));
                }
                Some(WatchEvent::Delete { key: deleted, .. }) => {
                    assert_eq!(deleted, key);
                    break;
                }
                Some(WatchEvent::Error(e)) => panic!("race produced an error: {e}"),
                None => panic!("stream closed early"),
            }
        }
    }

    writer.await.unwrap();
}
