//! Record-level operations: create, get, put, delete, list

use std::sync::Arc;

use strata_collections::{Collection, Error, MemStore};
use tokio_util::sync::CancellationToken;

use crate::common::*;

#[tokio::test]
async fn scenario_create_then_list() {
    let fx = Fixture::new();
    fx.create("j1", &job("running"));

    let view = fx.jobs.read_only(CancellationToken::new());
    let listed: Vec<(String, Job)> = view.list().await.unwrap().map(Result::unwrap).collect();
    assert_eq!(listed, vec![("j1".to_string(), job("running"))]);
}

#[tokio::test]
async fn scenario_get_missing_is_not_found() {
    let fx = Fixture::new();
    let view = fx.jobs.read_only(CancellationToken::new());

    let err = view.get("missing").await.unwrap_err();
    assert_eq!(
        err,
        Error::NotFound {
            collection: "jobs/".into(),
            key: "missing".into(),
        }
    );

    let err = fx
        .manager
        .transaction(|txn| fx.jobs.read_write(txn).get("missing"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn create_then_get_returns_record() {
    let fx = Fixture::new();
    let record = Job {
        state: "queued".into(),
        attempts: 3,
    };
    fx.create("j1", &record);

    let read = fx
        .manager
        .transaction(|txn| fx.jobs.read_write(txn).get("j1"))
        .unwrap();
    assert_eq!(read, record);
    assert_eq!(
        fx.jobs.read_only(CancellationToken::new()).get("j1").await.unwrap(),
        record
    );
}

#[test]
fn duplicate_create_keeps_first_record() {
    let fx = Fixture::new();
    fx.create("j1", &job("running"));

    let err = fx
        .manager
        .transaction(|txn| fx.jobs.read_write(txn).create("j1", &job("done")))
        .unwrap_err();
    assert_eq!(
        err,
        Error::AlreadyExists {
            collection: "jobs/".into(),
            key: "j1".into(),
        }
    );

    let read = fx
        .manager
        .transaction(|txn| fx.jobs.read_write(txn).get("j1"))
        .unwrap();
    assert_eq!(read, job("running"));
}

#[test]
fn stored_layout_is_plain_json_at_primary_path() {
    let fx = Fixture::new();
    fx.put("j1", &job("running"));

    let stored = fx.store.read("jobs/j1").unwrap();
    assert_eq!(stored.value, r#"{"State":"running","Attempts":0}"#);
    assert_eq!(
        fx.store.read("jobs__index_State/running/j1").unwrap().value,
        "j1"
    );
}

#[tokio::test]
async fn list_is_most_recently_modified_first() {
    let fx = Fixture::new();
    fx.put("a", &job("queued"));
    fx.put("b", &job("queued"));
    fx.put("c", &job("queued"));
    fx.put("a", &job("running"));

    let view = fx.jobs.read_only(CancellationToken::new());
    let keys: Vec<String> = view
        .list()
        .await
        .unwrap()
        .map(|item| item.unwrap().0)
        .collect();
    assert_eq!(keys, vec!["a", "c", "b"]);
}

#[tokio::test]
async fn list_is_lazy_and_stops_at_first_bad_record() {
    let fx = Fixture::new();
    fx.put("a", &job("queued"));
    fx.store.put("jobs/b", "not json").unwrap();
    fx.put("c", &job("queued"));

    let mut iter = fx
        .jobs
        .read_only(CancellationToken::new())
        .list()
        .await
        .unwrap();
    assert_eq!(iter.remaining(), 3);

    assert_eq!(iter.next().unwrap().unwrap().0, "c");
    assert!(matches!(iter.next(), Some(Err(Error::Serialization(_)))));
    assert!(iter.next().is_none());
}

#[tokio::test]
async fn prefixes_sharing_text_are_isolated() {
    let store = MemStore::new();
    let manager = strata_collections::TransactionManager::new(store.clone());
    let foo: Collection<Job, MemStore> = Collection::new(Arc::new(store.clone()), "foo/", Vec::new());
    let foobar: Collection<Job, MemStore> = Collection::new(Arc::new(store.clone()), "foobar", Vec::new());
    assert_eq!(foobar.prefix(), "foobar/");

    manager
        .transaction(|txn| {
            foo.read_write(txn).put("x", &job("queued"))?;
            foobar.read_write(txn).put("y", &job("queued"))
        })
        .unwrap();

    let cancel = CancellationToken::new();
    let foo_keys: Vec<String> = foo
        .read_only(cancel.clone())
        .list()
        .await
        .unwrap()
        .map(|item| item.unwrap().0)
        .collect();
    let foobar_keys: Vec<String> = foobar
        .read_only(cancel)
        .list()
        .await
        .unwrap()
        .map(|item| item.unwrap().0)
        .collect();

    assert_eq!(foo_keys, vec!["x"]);
    assert_eq!(foobar_keys, vec!["y"]);
}

#[test]
fn operations_in_one_transaction_commit_together() {
    let fx = Fixture::new();
    fx.put("old", &job("done"));

    let ((), revision) = fx
        .manager
        .transaction_with_revision(|txn| {
            let mut jobs = fx.jobs.read_write(txn);
            jobs.create("j1", &job("queued"))?;
            jobs.put("j2", &job("running"))?;
            jobs.delete("old")
        })
        .unwrap();

    assert_eq!(fx.store.mod_revision("jobs/j1"), revision);
    assert_eq!(fx.store.mod_revision("jobs/j2"), revision);
    assert_eq!(fx.store.mod_revision("jobs__index_State/queued/j1"), revision);
    assert!(fx.store.read("jobs/old").is_none());
    assert!(fx.store.read("jobs__index_State/done/old").is_none());
}

#[test]
fn delete_all_empties_collection_and_indexes() {
    let fx = Fixture::new();
    fx.put("j1", &job("running"));
    fx.put("j2", &job("done"));
    fx.store.put("jobsx/keep", "1").unwrap();

    fx.manager
        .transaction(|txn| fx.jobs.read_write(txn).delete_all())
        .unwrap();

    assert_eq!(fx.store.len(), 1);
    assert!(fx.store.read("jobsx/keep").is_some());
}
