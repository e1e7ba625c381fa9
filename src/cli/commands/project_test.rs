use crate::cli::commands::project::*;
use crate::cli::error::CliError;
use crate::db::{MemoryStore, Tracker};

#[tokio::test(flavor = "multi_thread")]
async fn test_create_and_show_project() {
    let tracker = Tracker::new(MemoryStore::new());
    let admin = tracker.users().login("admin").await.unwrap();

    let output = create_project(&tracker, "HOME", "Home", None, &admin)
        .await
        .unwrap();
    assert_eq!(output, "✓ Created project: Home (HOME)");

    let detail = show_project(&tracker, "home", "table").await.unwrap();
    assert!(detail.contains("HOME"));
    assert!(detail.contains("Head of Household"));
    assert!(detail.contains("0 (0 open)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_projects_json() {
    let tracker = Tracker::new(MemoryStore::new());
    let json = list_projects(&tracker, "json").await.unwrap();
    let projects: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["key"], "CHORE");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_unknown_project() {
    let tracker = Tracker::new(MemoryStore::new());
    let err = show_project(&tracker, "NOPE", "table").await.unwrap_err();
    assert!(matches!(err, CliError::NotFound { kind: "project", .. }));
}
