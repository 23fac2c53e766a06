//! Secondary index lookups and maintenance

use strata_collections::Error;
use tokio_util::sync::CancellationToken;

use crate::common::*;

async fn keys_for(fx: &Fixture, state: &str) -> Vec<String> {
    fx.jobs
        .read_only(CancellationToken::new())
        .get_by_index("State", state)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap()
        .into_iter()
        .map(|(key, _)| key)
        .collect()
}

#[tokio::test]
async fn scenario_lookup_after_create() {
    let fx = Fixture::new();
    fx.create("j1", &job("running"));

    let running = fx
        .jobs
        .read_only(CancellationToken::new())
        .get_by_index("State", "running")
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(running, vec![("j1".to_string(), job("running"))]);
}

#[tokio::test]
async fn scenario_put_moves_record_between_values() {
    let fx = Fixture::new();
    fx.create("j1", &job("running"));
    fx.put("j1", &job("done"));

    assert!(keys_for(&fx, "running").await.is_empty());
    assert_eq!(keys_for(&fx, "done").await, vec!["j1"]);
}

#[tokio::test]
async fn record_is_listed_under_its_value_only() {
    let fx = Fixture::new();
    fx.put("j1", &job("running"));
    fx.put("j2", &job("run"));
    fx.put("j3", &job("running"));

    let mut running = keys_for(&fx, "running").await;
    running.sort();
    assert_eq!(running, vec!["j1", "j3"]);
    assert_eq!(keys_for(&fx, "run").await, vec!["j2"]);
    assert!(keys_for(&fx, "runnin").await.is_empty());
}

#[tokio::test]
async fn lookup_is_most_recently_indexed_first() {
    let fx = Fixture::new();
    fx.put("a", &job("queued"));
    fx.put("b", &job("queued"));
    fx.put("c", &job("queued"));

    assert_eq!(keys_for(&fx, "queued").await, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn delete_removes_record_and_index_entry() {
    let fx = Fixture::new();
    fx.create("j1", &job("running"));
    fx.delete("j1");

    let view = fx.jobs.read_only(CancellationToken::new());
    assert!(view.get("j1").await.unwrap_err().is_not_found());
    assert!(keys_for(&fx, "running").await.is_empty());
    assert!(fx.store.is_empty());
}

#[tokio::test]
async fn records_deleted_after_lookup_surface_not_found() {
    let fx = Fixture::new();
    fx.put("j1", &job("running"));
    fx.put("j2", &job("running"));

    let mut iter = fx
        .jobs
        .read_only(CancellationToken::new())
        .get_by_index("State", "running")
        .await
        .unwrap();
    assert_eq!(iter.remaining(), 2);

    // j2 was indexed last and is visited first
    fx.delete("j1");
    assert_eq!(iter.next().await.unwrap().unwrap().0, "j2");
    let err = iter.next().await.unwrap().unwrap_err();
    assert_eq!(
        err,
        Error::NotFound {
            collection: "jobs/".into(),
            key: "j1".into(),
        }
    );
    assert!(iter.next().await.is_none());
}

#[tokio::test]
async fn undeclared_index_is_rejected() {
    let fx = Fixture::new();
    let err = fx
        .jobs
        .read_only(CancellationToken::new())
        .get_by_index("Owner", "ann")
        .await
        .err()
        .unwrap();
    assert_eq!(
        err,
        Error::UnknownIndex {
            collection: "jobs/".into(),
            index: "Owner".into(),
        }
    );
}

#[test]
fn unchanged_index_value_is_not_rewritten() {
    let fx = Fixture::new();
    fx.put("j1", &job("running"));
    let indexed_at = fx.store.mod_revision("jobs__index_State/running/j1");

    fx.put(
        "j1",
        &Job {
            state: "running".into(),
            attempts: 1,
        },
    );
    assert_eq!(fx.store.mod_revision("jobs__index_State/running/j1"), indexed_at);
    assert!(fx.store.mod_revision("jobs/j1") > indexed_at);
}

#[test]
fn corrupt_record_can_still_be_deleted() {
    let fx = Fixture::new();
    fx.store.put("jobs/j1", "{truncated").unwrap();

    fx.delete("j1");
    assert!(fx.store.read("jobs/j1").is_none());
}
