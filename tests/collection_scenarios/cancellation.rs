//! Cancellation of read-only views and watches

use std::time::Duration;

use strata_collections::{Error, WatchEvent};
use tokio_util::sync::CancellationToken;

use crate::common::*;

#[tokio::test]
async fn cancelled_view_rejects_reads() {
    let fx = Fixture::new();
    fx.put("j1", &job("running"));

    let cancel = CancellationToken::new();
    let view = fx.jobs.read_only(cancel.clone());
    assert!(view.get("j1").await.is_ok());

    cancel.cancel();
    assert_eq!(view.get("j1").await.unwrap_err(), Error::Cancelled);
    assert!(matches!(view.list().await, Err(Error::Cancelled)));
    assert!(matches!(
        view.get_by_index("State", "running").await,
        Err(Error::Cancelled)
    ));
}

#[tokio::test]
async fn cancelling_view_closes_every_watch() {
    let fx = Fixture::new();
    let cancel = CancellationToken::new();
    let view = fx.jobs.read_only(cancel.clone());

    let mut all = view.watch().await;
    let mut one = view.watch_one("j1").await;
    let mut by_state = view.watch_by_index("State", "running").await;
    assert_eq!(fx.store.watcher_count(), 3);

    cancel.cancel();
    assert!(next_event(&mut all).await.is_none());
    assert!(next_event(&mut one).await.is_none());
    assert!(next_event(&mut by_state).await.is_none());

    tokio::time::timeout(EVENT_TIMEOUT, async {
        while fx.store.watcher_count() > 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("watchers still registered after cancel");
}

#[tokio::test]
async fn cancelling_one_stream_leaves_others_open() {
    let fx = Fixture::new();
    let view = fx.jobs.read_only(CancellationToken::new());

    let mut first = view.watch().await;
    let mut second = view.watch().await;
    first.cancel();
    assert!(next_event(&mut first).await.is_none());

    fx.put("j1", &job("running"));
    match next_event(&mut second).await {
        Some(WatchEvent::Put { key, record, .. }) => {
            assert_eq!(key, "j1");
            assert_eq!(record, job("running"));
        }
        other => panic!("expected put, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_closes_once_when_store_shuts_down() {
    let fx = Fixture::new();
    let mut stream = fx
        .jobs
        .read_only(CancellationToken::new())
        .watch_by_index("State", "running")
        .await;

    fx.store.shutdown_watches();
    assert!(next_event(&mut stream).await.is_none());
    assert!(next_event(&mut stream).await.is_none());
}
