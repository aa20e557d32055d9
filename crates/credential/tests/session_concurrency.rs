//! Integration tests for concurrent lifecycle operations on one session

mod common;

use atlas_admin::testing::{CallEvent, FakeAtlas};
use atlas_admin::{AtlasApi, DatabaseUser, DatabaseUserUpdate};
use atlas_credential::prelude::*;
use common::{READ_STATEMENT, config, database_counting, issue};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn assert_serialized(events: &[CallEvent]) {
    assert!(events.len() % 2 == 0, "unbalanced events: {events:?}");
    for pair in events.chunks(2) {
        match pair {
            [CallEvent::Started(a), CallEvent::Finished(b)] => assert_eq!(a, b),
            other => panic!("calls overlapped: {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_never_overlap() {
    // GIVEN: A slow Atlas and seeded users to update and revoke
    let fake = Arc::new(FakeAtlas::new().with_latency(Duration::from_millis(15)));
    for i in 0..4 {
        fake.insert_user("p1", DatabaseUser::new(format!("update-{i}"), "old", "admin"));
        fake.insert_user("p1", DatabaseUser::new(format!("revoke-{i}"), "old", "admin"));
    }
    let built = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(database_counting(&fake, &built));
    db.initialize(InitializeRequest::new(config())).await.unwrap();

    // WHEN: Issue, update and revoke run from many tasks at once
    let mut handles = Vec::new();
    for i in 0..4 {
        let issue_db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            issue_db.new_user(issue("test", &[READ_STATEMENT])).await.map(|_| ())
        }));
        let update_db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            update_db.update_user(UpdateUserRequest::new(format!("update-{i}")).with_password("new"))
                .await
                .map(|_| ())
        }));
        let delete_db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            delete_db.delete_user(DeleteUserRequest::new(format!("revoke-{i}")))
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // THEN: Every remote call ran alone and the client was built once
    assert_eq!(fake.call_count(), 12);
    assert_eq!(fake.max_in_flight(), 1);
    assert_serialized(&fake.events());
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_builds_one_client() {
    let fake = Arc::new(FakeAtlas::new());
    let built = Arc::new(AtomicUsize::new(0));
    let db = Arc::new(database_counting(&fake, &built));
    db.initialize(InitializeRequest::new(config())).await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let db = Arc::clone(&db);
            tokio::spawn(async move { db.session().client().await.map(|_| ()) })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fake_detects_overlap_without_session() {
    // Calls made straight against the fake, bypassing the session lock, do overlap.
    let fake = Arc::new(FakeAtlas::new().with_latency(Duration::from_millis(20)));
    fake.insert_user("p1", DatabaseUser::new("a", "x", "admin"));
    fake.insert_user("p1", DatabaseUser::new("b", "x", "admin"));

    let update = DatabaseUserUpdate::password("y");
    let (a, b) = tokio::join!(
        fake.update_database_user("p1", "admin", "a", &update),
        fake.update_database_user("p1", "admin", "b", &update),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(fake.max_in_flight(), 2);
}

#[tokio::test]
async fn test_close_waits_for_running_operation() {
    let fake = Arc::new(FakeAtlas::new().with_latency(Duration::from_millis(20)));
    let built = Arc::new(AtomicUsize::new(0));
    let db = database_counting(&fake, &built);
    db.initialize(InitializeRequest::new(config())).await.unwrap();

    let (issued, closed) = tokio::join!(db.new_user(issue("test", &[READ_STATEMENT])), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        db.close().await
    });
    issued.unwrap();
    closed.unwrap();

    assert!(!db.session().has_client().await);
    assert_eq!(fake.call_count(), 1);
}
