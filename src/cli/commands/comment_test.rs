use crate::cli::commands::comment::*;
use crate::cli::commands::issue::{IssueFields, create_issue};
use crate::db::{MemoryStore, Tracker, User};

async fn setup() -> (Tracker<MemoryStore>, User) {
    let tracker = Tracker::new(MemoryStore::new());
    let admin = tracker.users().login("admin").await.unwrap();
    create_issue(&tracker, "CHORE", "Clean fridge", None, IssueFields::default(), &admin)
        .await
        .unwrap();
    (tracker, admin)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_and_list_comments() {
    let (tracker, admin) = setup().await;

    let output = add_comment(&tracker, "CHORE-1", "Something is growing in there", true, &admin)
        .await
        .unwrap();
    assert_eq!(output, "✓ Commented on CHORE-1 (comment 1)");

    let table = list_comments(&tracker, "CHORE-1", "table").await.unwrap();
    assert!(table.contains("Head of Household"));
    assert!(table.contains("Something is growing in there 🙂"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_edit_comment_marks_edited() {
    let (tracker, admin) = setup().await;
    add_comment(&tracker, "CHORE-1", "Done", false, &admin)
        .await
        .unwrap();

    let output = edit_comment(&tracker, 1, "Done-ish").await.unwrap();
    assert_eq!(output, "✓ Edited comment 1");

    let json = list_comments(&tracker, "CHORE-1", "json").await.unwrap();
    let comments: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(comments[0]["content"], "Done-ish");
    assert_eq!(comments[0]["is_edited"], true);
    assert_eq!(comments[0]["author_name"], "Head of Household");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_comments_empty() {
    let (tracker, _) = setup().await;
    let output = list_comments(&tracker, "CHORE-1", "table").await.unwrap();
    assert_eq!(output, "No comments yet.");
}
