//! Tests for SprintRepository.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::db::utils::MockClock;
use crate::db::validation::validate_sprint_dates;
use crate::db::{DbError, Id, MemoryStore, NewBoard, NewSprint, SprintStatus, Tracker};

async fn setup() -> (Tracker<MemoryStore>, Id) {
    let mut clock = MockClock::new();
    clock
        .expect_now()
        .return_const(Utc.with_ymd_and_hms(2025, 4, 12, 9, 30, 0).unwrap());
    let tracker = Tracker::with_clock(MemoryStore::new(), Arc::new(clock));

    let chore = tracker.projects().get_by_key("CHORE").await.unwrap().unwrap();
    let board = tracker
        .boards()
        .create(&NewBoard {
            project_id: chore.id,
            name: "Weekly".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    (tracker, board.id)
}

fn sprint(board_id: Id, name: &str) -> NewSprint {
    NewSprint {
        board_id,
        name: name.to_string(),
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn new_sprints_are_future() {
    let (tracker, board_id) = setup().await;
    let created = tracker
        .sprints()
        .create(&sprint(board_id, "Spring clean"))
        .await
        .unwrap();
    assert_eq!(created.status, SprintStatus::Future);
    assert_eq!(created.created_at, "2025-04-12 09:30:00");
    assert_eq!(tracker.sprints().get_active(board_id).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn start_and_close_default_dates_to_today() {
    let (tracker, board_id) = setup().await;
    let repo = tracker.sprints();
    let created = repo.create(&sprint(board_id, "Spring clean")).await.unwrap();

    let started = repo.start_sprint(created.id).await.unwrap();
    assert_eq!(started.status, SprintStatus::Active);
    assert_eq!(started.start_date.as_deref(), Some("2025-04-12"));
    assert_eq!(repo.get_active(board_id).await.unwrap(), Some(started));

    let closed = repo.close_sprint(created.id).await.unwrap();
    assert_eq!(closed.status, SprintStatus::Closed);
    assert_eq!(repo.get_active(board_id).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn close_defaults_end_date_after_start() {
    let (tracker, board_id) = setup().await;
    let repo = tracker.sprints();
    let mut input = sprint(board_id, "Attic");
    input.start_date = Some("2025-04-07".to_string());
    let created = repo.create(&input).await.unwrap();

    let closed = repo.close_sprint(created.id).await.unwrap();
    assert_eq!(closed.end_date.as_deref(), Some("2025-04-12"));
}

#[tokio::test(flavor = "multi_thread")]
async fn same_day_close_leaves_end_date_unset() {
    let (tracker, board_id) = setup().await;
    let repo = tracker.sprints();
    let created = repo.create(&sprint(board_id, "Quick tidy")).await.unwrap();

    repo.start_sprint(created.id).await.unwrap();
    let closed = repo.close_sprint(created.id).await.unwrap();
    assert_eq!(closed.start_date.as_deref(), Some("2025-04-12"));
    assert_eq!(closed.end_date, None);

    let stored = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored, closed);
    assert!(validate_sprint_dates(&stored).is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn starting_after_planned_end_is_rejected() {
    let (tracker, board_id) = setup().await;
    let repo = tracker.sprints();
    let mut input = sprint(board_id, "Missed it");
    input.end_date = Some("2025-04-01".to_string());
    let created = repo.create(&input).await.unwrap();

    let err = repo.start_sprint(created.id).await.unwrap_err();
    assert!(matches!(err, DbError::Validation { ref errors } if errors[0].field == "end_date"));

    let stored = repo.get_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SprintStatus::Future);
    assert_eq!(stored.start_date, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn explicit_dates_are_kept() {
    let (tracker, board_id) = setup().await;
    let repo = tracker.sprints();
    let mut input = sprint(board_id, "Garage");
    input.start_date = Some("2025-04-01".to_string());
    input.end_date = Some("2025-04-14".to_string());
    let created = repo.create(&input).await.unwrap();

    let started = repo.start_sprint(created.id).await.unwrap();
    assert_eq!(started.start_date.as_deref(), Some("2025-04-01"));
    let closed = repo.close_sprint(created.id).await.unwrap();
    assert_eq!(closed.end_date.as_deref(), Some("2025-04-14"));
}

#[tokio::test(flavor = "multi_thread")]
async fn end_before_start_is_rejected() {
    let (tracker, board_id) = setup().await;
    let mut input = sprint(board_id, "Backwards");
    input.start_date = Some("2025-04-14".to_string());
    input.end_date = Some("2025-04-01".to_string());

    let err = tracker.sprints().create(&input).await.unwrap_err();
    assert!(matches!(err, DbError::Validation { ref errors } if errors[0].field == "end_date"));
}

#[tokio::test(flavor = "multi_thread")]
async fn sprint_requires_existing_board() {
    let (tracker, _) = setup().await;
    let err = tracker
        .sprints()
        .create(&sprint(404, "Nowhere"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));

    let err = tracker.sprints().start_sprint(404).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn sprints_list_oldest_first() {
    let (tracker, board_id) = setup().await;
    let repo = tracker.sprints();
    let first = repo.create(&sprint(board_id, "One")).await.unwrap();
    let second = repo.create(&sprint(board_id, "Two")).await.unwrap();

    assert_eq!(repo.get_all().await.unwrap(), vec![first.clone(), second.clone()]);
    assert_eq!(repo.get_by_board(board_id).await.unwrap().len(), 2);
    assert_eq!(repo.get_by_id(first.id).await.unwrap(), Some(first));
}
