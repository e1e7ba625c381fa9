use crate::cli::commands::excuse::random_excuse;
use crate::cli::commands::gamification::*;
use crate::cli::commands::issue::{IssueFields, create_issue, set_status};
use crate::db::{MemoryStore, Tracker, User};

async fn setup() -> (Tracker<MemoryStore>, User) {
    let tracker = Tracker::new(MemoryStore::new());
    let admin = tracker.users().login("admin").await.unwrap();
    (tracker, admin)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stats_for_new_user() {
    let (tracker, admin) = setup().await;
    let table = show_stats(&tracker, &admin, "table").await.unwrap();
    assert!(table.contains("1 (Couch Potato)"));
    assert!(table.contains("100 points"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_achievements_show_progress() {
    let (tracker, admin) = setup().await;
    create_issue(&tracker, "CHORE", "Feed cat", None, IssueFields::default(), &admin)
        .await
        .unwrap();
    set_status(&tracker, "CHORE-1", "done", &admin).await.unwrap();

    let table = achievements(&tracker, &admin, "table").await.unwrap();
    assert!(table.starts_with("Head of Household: 1 of 9 earned"));

    let json = achievements(&tracker, &admin, "json").await.unwrap();
    let list: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(list[0]["code"], "first_task");
    assert!(list[0]["earned_at"].is_string());
    assert!(list[1]["earned_at"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_leaderboard_ranks_users() {
    let (tracker, admin) = setup().await;
    create_issue(&tracker, "CHORE", "Feed cat", None, IssueFields::default(), &admin)
        .await
        .unwrap();
    set_status(&tracker, "CHORE-1", "done", &admin).await.unwrap();

    let json = leaderboard(&tracker, "json").await.unwrap();
    let entries: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(entries[0]["rank"], 1);
    assert_eq!(entries[0]["total_points"], 20);
    assert_eq!(entries[0]["title"], "Couch Potato");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_random_excuse() {
    let (tracker, _) = setup().await;
    let output = random_excuse(&tracker, Some("yard"), "table").await.unwrap();
    assert!(output.contains("[yard]"));

    let none = random_excuse(&tracker, Some("taxes"), "table").await.unwrap();
    assert_eq!(none, "No excuses for 'taxes'. You'll just have to do it.");
}
