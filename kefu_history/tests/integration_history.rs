//! Integration tests for the `sea-orm` history store.
//!
//! Each test runs against a throwaway SQLite file.

use kefu_core::{Exchange, HistoryStore};
use kefu_history::HistoryManager;
use tempfile::TempDir;

async fn open_store() -> (TempDir, HistoryManager) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("history.db").display());
    let store = HistoryManager::new(&url)
        .await
        .expect("Failed to open history store");
    (dir, store)
}

#[tokio::test]
async fn test_empty_history() {
    let (_dir, store) = open_store().await;

    let window = store
        .query_recent("u1", "jd", 5, 1000)
        .await
        .expect("Query failed");

    assert!(window.is_empty());
}

#[tokio::test]
async fn test_append_and_query_most_recent_first() {
    let (_dir, store) = open_store().await;

    for i in 0..3 {
        store
            .append(&Exchange::new("u1", "jd", format!("q{i}"), format!("a{i}")))
            .await
            .expect("Append failed");
    }

    let window = store
        .query_recent("u1", "jd", 5, 1000)
        .await
        .expect("Query failed");

    let users: Vec<&str> = window
        .exchanges()
        .iter()
        .map(|e| e.user_message.as_str())
        .collect();
    assert_eq!(users, vec!["q2", "q1", "q0"]);
    assert_eq!(window.exchanges()[0].assistant_message, "a2");
}

#[tokio::test]
async fn test_query_is_scoped_by_user_and_platform() {
    let (_dir, store) = open_store().await;

    store
        .append(&Exchange::new("u1", "jd", "mine", "ok"))
        .await
        .expect("Append failed");
    store
        .append(&Exchange::new("u1", "taobao", "other platform", "ok"))
        .await
        .expect("Append failed");
    store
        .append(&Exchange::new("u2", "jd", "other user", "ok"))
        .await
        .expect("Append failed");

    let window = store
        .query_recent("u1", "jd", 5, 1000)
        .await
        .expect("Query failed");

    assert_eq!(window.len(), 1);
    assert_eq!(window.exchanges()[0].user_message, "mine");
    assert_eq!(store.count("u1", "taobao").await.expect("Count failed"), 1);
}

#[tokio::test]
async fn test_token_budget_truncates_window() {
    let (_dir, store) = open_store().await;

    // Oldest to newest: each exchange is 100 approximate tokens.
    for i in 0..5 {
        store
            .append(&Exchange::new(
                "u1",
                "jd",
                format!("{i}{}", "u".repeat(49)),
                "a".repeat(50),
            ))
            .await
            .expect("Append failed");
    }

    let window = store
        .query_recent("u1", "jd", 5, 350)
        .await
        .expect("Query failed");

    assert_eq!(window.len(), 3);
    assert!(window.total_tokens() <= 350);
    assert!(window.exchanges()[0].user_message.starts_with('4'));
    assert!(window.exchanges()[2].user_message.starts_with('2'));
}

#[tokio::test]
async fn test_max_count_limits_window() {
    let (_dir, store) = open_store().await;

    for i in 0..8 {
        store
            .append(&Exchange::new("u1", "jd", format!("q{i}"), "a"))
            .await
            .expect("Append failed");
    }

    let window = store
        .query_recent("u1", "jd", 5, 1000)
        .await
        .expect("Query failed");

    assert_eq!(window.len(), 5);
    assert_eq!(store.count("u1", "jd").await.expect("Count failed"), 8);
}
