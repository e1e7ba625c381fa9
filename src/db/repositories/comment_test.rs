//! Tests for CommentRepository.

use crate::db::{DbError, Id, MemoryStore, NewComment, NewIssue, Tracker};

use super::UNKNOWN_AUTHOR;

const ADMIN: Id = 1;

async fn setup() -> (Tracker<MemoryStore>, Id) {
    let tracker = Tracker::new(MemoryStore::new());
    let chore = tracker
        .projects()
        .get_by_key("CHORE")
        .await
        .unwrap()
        .expect("Default project should be seeded");
    let issue = tracker
        .issues()
        .create(&NewIssue {
            project_id: chore.id,
            summary: "Unload dishwasher".to_string(),
            reporter_id: ADMIN,
            ..Default::default()
        })
        .await
        .unwrap();
    (tracker, issue.id)
}

fn comment(issue_id: Id, author_id: Id, content: &str) -> NewComment {
    NewComment {
        issue_id,
        author_id,
        content: content.to_string(),
        is_passive_aggressive: false,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn comments_list_oldest_first_with_author() {
    let (tracker, issue_id) = setup().await;
    let repo = tracker.comments();

    let first = repo.create(&comment(issue_id, ADMIN, "On it")).await.unwrap();
    let second = repo
        .create(&comment(issue_id, ADMIN, "Any minute now"))
        .await
        .unwrap();

    let listed = repo.get_by_issue_id(issue_id).await.unwrap();
    assert_eq!(
        listed.iter().map(|c| c.comment.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    assert_eq!(listed[0].author_name, "Head of Household");
    assert!(!listed[0].comment.is_edited);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_author_falls_back_to_unknown() {
    let (tracker, issue_id) = setup().await;
    tracker
        .comments()
        .create(&comment(issue_id, 77, "Who wrote this?"))
        .await
        .unwrap();

    let listed = tracker.comments().get_by_issue_id(issue_id).await.unwrap();
    assert_eq!(listed[0].author_name, UNKNOWN_AUTHOR);
    assert_eq!(listed[0].author_avatar, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_marks_comment_edited() {
    let (tracker, issue_id) = setup().await;
    let repo = tracker.comments();
    let created = repo.create(&comment(issue_id, ADMIN, "Done")).await.unwrap();

    let updated = repo.update(created.id, "Done. Mostly.").await.unwrap();
    assert!(updated.is_edited);
    assert_eq!(updated.content, "Done. Mostly.");
    assert_eq!(repo.get_by_id(created.id).await.unwrap(), Some(updated));
}

#[tokio::test(flavor = "multi_thread")]
async fn comment_requires_existing_issue() {
    let (tracker, _) = setup().await;
    let err = tracker
        .comments()
        .create(&comment(404, ADMIN, "Hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_comment_is_rejected() {
    let (tracker, issue_id) = setup().await;
    let err = tracker
        .comments()
        .create(&comment(issue_id, ADMIN, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_comment() {
    let (tracker, issue_id) = setup().await;
    let repo = tracker.comments();
    let created = repo.create(&comment(issue_id, ADMIN, "Oops")).await.unwrap();

    repo.delete(created.id).await.unwrap();
    assert_eq!(repo.get_by_id(created.id).await.unwrap(), None);
    assert!(repo.get_by_issue_id(issue_id).await.unwrap().is_empty());
}
