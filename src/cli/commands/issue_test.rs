use chrono::NaiveDate;

use crate::cli::commands::issue::*;
use crate::cli::error::CliError;
use crate::db::{DbError, MemoryStore, Priority, Tracker, User};

async fn setup() -> (Tracker<MemoryStore>, User) {
    let tracker = Tracker::new(MemoryStore::new());
    let admin = tracker.users().login("admin").await.unwrap();
    (tracker, admin)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_issue_with_fields() {
    let (tracker, admin) = setup().await;
    let fields = IssueFields {
        priority: Some(Priority::High),
        issue_type: Some("Errand".to_string()),
        assignee: Some("admin".to_string()),
        due: Some("2025-07-01".to_string()),
        ..Default::default()
    };

    let output = create_issue(&tracker, "chore", "Buy light bulbs", None, fields, &admin)
        .await
        .unwrap();
    assert_eq!(output, "✓ Created issue: CHORE-1 Buy light bulbs");

    let detail = show_issue(&tracker, "CHORE-1", "table").await.unwrap();
    assert!(detail.contains("Errand"));
    assert!(detail.contains("high"));
    assert!(detail.contains("2025-07-01"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_issue_type_is_reported() {
    let (tracker, admin) = setup().await;
    let fields = IssueFields {
        issue_type: Some("Spaceship".to_string()),
        ..Default::default()
    };
    let err = create_issue(&tracker, "CHORE", "Launch", None, fields, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::NotFound { kind: "issue type", .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_completing_issue_awards_points() {
    let (tracker, admin) = setup().await;
    create_issue(&tracker, "CHORE", "Take out recycling", None, IssueFields::default(), &admin)
        .await
        .unwrap();

    let output = set_status(&tracker, "CHORE-1", "done", &admin).await.unwrap();
    assert!(output.starts_with("✓ CHORE-1: todo → done"));
    assert!(output.contains("+10 points"));
    assert!(output.contains("Achievement unlocked: First Steps"));

    let again = set_status(&tracker, "1", "done", &admin).await.unwrap();
    assert_eq!(again, "CHORE-1 is already done");
    let stats = tracker.gamification().get_stats(admin.id).await.unwrap();
    assert_eq!(stats.tasks_completed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_clears_with_empty_string() {
    let (tracker, admin) = setup().await;
    let fields = IssueFields {
        assignee: Some("admin".to_string()),
        ..Default::default()
    };
    create_issue(&tracker, "CHORE", "Sweep porch", None, fields, &admin)
        .await
        .unwrap();

    let clear = IssueFields {
        assignee: Some(String::new()),
        ..Default::default()
    };
    let output = update_issue(&tracker, "CHORE-1", None, clear, &admin)
        .await
        .unwrap();
    assert_eq!(output, "✓ Updated issue: CHORE-1");
    let issue = tracker.issues().get_by_key("CHORE-1").await.unwrap().unwrap();
    assert_eq!(issue.assignee_id, None);

    let unchanged = update_issue(&tracker, "CHORE-1", None, IssueFields::default(), &admin)
        .await
        .unwrap();
    assert_eq!(unchanged, "Nothing to change on CHORE-1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_and_delete() {
    let (tracker, admin) = setup().await;
    create_issue(&tracker, "CHORE", "Defrost freezer", None, IssueFields::default(), &admin)
        .await
        .unwrap();
    set_status(&tracker, "CHORE-1", "in_progress", &admin).await.unwrap();

    let output = delete_issue(&tracker, "CHORE-1", &admin).await.unwrap();
    assert_eq!(output, "✓ Deleted issue: CHORE-1");

    let err = show_issue(&tracker, "CHORE-1", "table").await.unwrap_err();
    assert!(matches!(err, CliError::NotFound { kind: "issue", .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_lists_changes() {
    let (tracker, admin) = setup().await;
    create_issue(&tracker, "CHORE", "Defrost freezer", None, IssueFields::default(), &admin)
        .await
        .unwrap();
    set_status(&tracker, "CHORE-1", "in_progress", &admin).await.unwrap();

    let json = issue_history(&tracker, "CHORE-1", "json").await.unwrap();
    let history: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(history[0]["change_type"], "created");
    assert_eq!(history[1]["field_name"], "status");
    assert_eq!(history[1]["new_value"], "in_progress");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_status_is_a_validation_error() {
    let (tracker, admin) = setup().await;
    create_issue(&tracker, "CHORE", "Paint fence", None, IssueFields::default(), &admin)
        .await
        .unwrap();
    let err = set_status(&tracker, "CHORE-1", "DONE!!", &admin).await.unwrap_err();
    assert!(matches!(err, CliError::Db(DbError::Validation { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_and_overdue() {
    let (tracker, admin) = setup().await;
    let late = IssueFields {
        due: Some("2025-01-01".to_string()),
        ..Default::default()
    };
    create_issue(&tracker, "CHORE", "File taxes", None, late, &admin)
        .await
        .unwrap();
    create_issue(&tracker, "CHORE", "Water plants", None, IssueFields::default(), &admin)
        .await
        .unwrap();

    let all = list_issues(&tracker, IssueFilter::default(), "table").await.unwrap();
    assert!(all.contains("CHORE-1"));
    assert!(all.contains("CHORE-2"));

    let mine = list_issues(
        &tracker,
        IssueFilter {
            assignee: Some("admin"),
            ..Default::default()
        },
        "table",
    )
    .await
    .unwrap();
    assert_eq!(mine, "No issues found.");

    let today = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
    let overdue = overdue_issues(&tracker, today, "table").await.unwrap();
    assert!(overdue.contains("File taxes"));
    assert!(overdue.contains("10"));
    assert!(!overdue.contains("Water plants"));
}
