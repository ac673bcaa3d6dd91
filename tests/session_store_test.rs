// tests/session_store_test.rs — Integration test: JSONL session log on disk

use std::sync::Arc;

use pretty_assertions::assert_eq;

use calai::core::types::{Intent, Turn, TurnResult};
use calai::infra::errors::ErrorKind;
use calai::session::store::SessionStore;
use calai::session::SessionId;

fn turn(q: &str) -> Turn {
    Turn::new(Some(q), None, Intent::GeneralQuestion, TurnResult::answer(format!("re: {q}")))
        .unwrap()
}

fn id(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

#[tokio::test]
async fn test_unknown_session_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());

    let session = store.load(&id("fresh")).await;
    assert!(session.is_empty());
    assert_eq!(session.id, id("fresh"));
    // Loading must not create anything on disk.
    assert!(!store.session_dir(&id("fresh")).exists());
}

#[tokio::test]
async fn test_load_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store.append(&id("s1"), &turn("a")).await.unwrap();
    store.append(&id("s1"), &turn("b")).await.unwrap();

    let first = store.load(&id("s1")).await;
    let second = store.load(&id("s1")).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first.turns[0].query.as_deref(), Some("a"));
    assert_eq!(first.turns[1].query.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_log_survives_new_store_instance() {
    let dir = tempfile::tempdir().unwrap();
    SessionStore::new(dir.path())
        .append(&id("s1"), &turn("remember me"))
        .await
        .unwrap();

    let reopened = SessionStore::new(dir.path());
    let session = reopened.load(&id("s1")).await;
    assert_eq!(session.len(), 1);
    assert_eq!(session.turns[0].result, TurnResult::answer("re: remember me"));
}

#[tokio::test]
async fn test_corrupt_lines_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());
    store.append(&id("s1"), &turn("good")).await.unwrap();

    let path = store.turns_path(&id("s1"));
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{\"half\": \n");
    std::fs::write(&path, content).unwrap();
    store.append(&id("s1"), &turn("after")).await.unwrap();

    let session = store.load(&id("s1")).await;
    assert_eq!(session.len(), 2);
    assert_eq!(session.turns[1].query.as_deref(), Some("after"));
}

#[tokio::test]
async fn test_concurrent_appends_all_land() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SessionStore::new(dir.path()));

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.append(&id("busy"), &turn(&format!("q{i}"))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let session = store.load(&id("busy")).await;
    assert_eq!(session.len(), 20);
    let raw = std::fs::read_to_string(store.turns_path(&id("busy"))).unwrap();
    assert_eq!(raw.lines().count(), 20);
}

#[tokio::test]
async fn test_sessions_do_not_share_logs() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path());

    store.append(&id("alice"), &turn("x")).await.unwrap();
    store.append(&id("bob"), &turn("y")).await.unwrap();
    store.append(&id("bob"), &turn("z")).await.unwrap();

    assert_eq!(store.load(&id("alice")).await.len(), 1);
    assert_eq!(store.load(&id("bob")).await.len(), 2);
}

#[tokio::test]
async fn test_append_into_file_root_fails() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let store = SessionStore::new(file.path());

    let err = store.append(&id("s1"), &turn("x")).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::StorageUnavailable));
    // Load still succeeds with an empty session.
    assert!(store.load(&id("s1")).await.is_empty());
}
