//! End-to-end flows run against both store backends.

use crate::db::store::EntityStore;
use crate::db::{
    ChangeType, IssueUpdate, MemoryStore, NewBoard, NewComment, NewIssue, NewProject, NewSprint,
    SqliteStore, Tracker,
};

async fn household_flow<S: EntityStore>(tracker: Tracker<S>) {
    let admin = tracker.users().login("admin").await.expect("Seeded admin");

    let project = tracker
        .projects()
        .create(&NewProject {
            name: "Home".to_string(),
            key: "HOME".to_string(),
            description: Some("The house".to_string()),
            created_by: admin.id,
        })
        .await
        .unwrap();
    let board = tracker
        .boards()
        .create(&NewBoard {
            project_id: project.id,
            name: "Weekend".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let sprint = tracker
        .sprints()
        .create(&NewSprint {
            board_id: board.id,
            name: "Saturday".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let issues = tracker.issues();
    let issue = issues
        .create(&NewIssue {
            project_id: project.id,
            summary: "Clean gutters".to_string(),
            reporter_id: admin.id,
            assignee_id: Some(admin.id),
            spouse_approval_required: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(issue.issue_key, "HOME-1");
    assert!(issue.spouse_approval_required);

    let planned = issues
        .update(
            issue.id,
            &IssueUpdate {
                sprint_id: Some(Some(sprint.id)),
                ..Default::default()
            },
            admin.id,
        )
        .await
        .unwrap();
    assert_eq!(planned.sprint_id, Some(sprint.id));
    assert_eq!(issues.get_by_sprint(sprint.id).await.unwrap().len(), 1);

    tracker.sprints().start_sprint(sprint.id).await.unwrap();
    assert!(tracker.sprints().get_active(board.id).await.unwrap().is_some());

    tracker
        .comments()
        .create(&NewComment {
            issue_id: issue.id,
            author_id: admin.id,
            content: "Ladder is in the shed".to_string(),
            is_passive_aggressive: false,
        })
        .await
        .unwrap();

    let done = issues.update_status(issue.id, "done", admin.id).await.unwrap();
    assert!(done.resolved_at.is_some());
    let outcome = tracker
        .gamification()
        .update_streak_on_completion(admin.id)
        .await
        .unwrap();
    assert_eq!(outcome.stats.tasks_completed, 1);
    assert_eq!(
        tracker.gamification().get_stats(admin.id).await.unwrap(),
        outcome.stats
    );

    issues.delete(issue.id, admin.id).await.unwrap();
    assert_eq!(issues.get_by_key("HOME-1").await.unwrap(), None);

    let history = tracker.history().get_by_issue_id(issue.id).await.unwrap();
    let kinds: Vec<(ChangeType, &str)> = history
        .iter()
        .map(|h| (h.change_type, h.field_name.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (ChangeType::Created, "issue"),
            (ChangeType::Updated, "sprint_id"),
            (ChangeType::Updated, "status"),
            (ChangeType::Deleted, "issue"),
        ]
    );
    assert_eq!(
        tracker.comments().get_by_issue_id(issue.id).await.unwrap().len(),
        1
    );

    let next = issues
        .create(&NewIssue {
            project_id: project.id,
            summary: "Clean gutters again".to_string(),
            reporter_id: admin.id,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(next.issue_key, "HOME-2");

    issues
        .create(&NewIssue {
            project_id: project.id,
            summary: "Sweep porch".to_string(),
            reporter_id: admin.id,
            ..Default::default()
        })
        .await
        .unwrap();
    issues.delete(next.id, admin.id).await.unwrap();
    let latest = issues
        .create(&NewIssue {
            project_id: project.id,
            summary: "Sweep porch again".to_string(),
            reporter_id: admin.id,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(latest.issue_key, "HOME-4");
}

#[tokio::test(flavor = "multi_thread")]
async fn household_flow_in_memory() {
    household_flow(Tracker::new(MemoryStore::new())).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn household_flow_in_sqlite() {
    let store = SqliteStore::in_memory().expect("In-memory SQLite should open");
    household_flow(Tracker::new(store)).await;
}
