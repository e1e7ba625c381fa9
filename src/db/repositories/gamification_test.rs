//! Tests for levels, streaks, achievements and the leaderboard.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::{LEVELS, POINTS_PER_COMPLETION, level_for_points, level_title};
use crate::db::utils::MockClock;
use crate::db::{Id, MemoryStore, NewUser, Tracker};

const ADMIN: Id = 1;

/// A tracker whose clock can be moved by the returned handle.
fn setup() -> (Tracker<MemoryStore>, Arc<Mutex<DateTime<Utc>>>) {
    let now = Arc::new(Mutex::new(
        Utc.with_ymd_and_hms(2025, 3, 3, 18, 0, 0).unwrap(),
    ));
    let handle = Arc::clone(&now);
    let mut clock = MockClock::new();
    clock
        .expect_now()
        .returning(move || *handle.lock().unwrap());
    (
        Tracker::with_clock(MemoryStore::new(), Arc::new(clock)),
        now,
    )
}

fn advance(now: &Mutex<DateTime<Utc>>, days: i64) {
    let mut guard = now.lock().unwrap();
    *guard += Duration::days(days);
}

#[test]
fn level_boundaries() {
    assert_eq!(level_for_points(0), 1);
    assert_eq!(level_for_points(99), 1);
    assert_eq!(level_for_points(100), 2);
    assert_eq!(level_for_points(249), 2);
    assert_eq!(level_for_points(250), 3);
    assert_eq!(level_for_points(10_000), 10);
    assert_eq!(level_for_points(1_000_000), 10);
}

#[test]
fn level_table_is_ascending() {
    assert!(LEVELS.windows(2).all(|w| w[0].min_points < w[1].min_points));
    assert_eq!(level_title(3), "Dish Rinser");
    assert_eq!(level_title(42), LEVELS[0].title);
}

#[tokio::test(flavor = "multi_thread")]
async fn stats_default_to_zero() {
    let (tracker, _) = setup();
    let stats = tracker.gamification().get_stats(ADMIN).await.unwrap();
    assert_eq!(stats.total_points, 0);
    assert_eq!(stats.level, 1);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.last_completion_date, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn first_completion_earns_points_and_first_achievement() {
    let (tracker, _) = setup();
    let outcome = tracker
        .gamification()
        .update_streak_on_completion(ADMIN)
        .await
        .unwrap();

    assert_eq!(outcome.stats.tasks_completed, 1);
    assert_eq!(outcome.stats.current_streak, 1);
    assert_eq!(outcome.stats.last_completion_date.as_deref(), Some("2025-03-03"));
    assert_eq!(
        outcome
            .new_achievements
            .iter()
            .map(|a| a.code.as_str())
            .collect::<Vec<_>>(),
        vec!["first_task"]
    );
    assert_eq!(
        outcome.stats.total_points,
        POINTS_PER_COMPLETION + outcome.new_achievements[0].points
    );
    assert!(!outcome.leveled_up());
}

#[tokio::test(flavor = "multi_thread")]
async fn streak_follows_calendar_days() {
    let (tracker, now) = setup();
    let repo = tracker.gamification();

    assert_eq!(repo.update_streak_on_completion(ADMIN).await.unwrap().stats.current_streak, 1);

    // Same day keeps the streak.
    let same_day = repo.update_streak_on_completion(ADMIN).await.unwrap();
    assert_eq!(same_day.stats.current_streak, 1);

    advance(&now, 1);
    assert_eq!(repo.update_streak_on_completion(ADMIN).await.unwrap().stats.current_streak, 2);

    advance(&now, 1);
    let third = repo.update_streak_on_completion(ADMIN).await.unwrap();
    assert_eq!(third.stats.current_streak, 3);
    assert!(third.new_achievements.iter().any(|a| a.code == "streak_3"));

    advance(&now, 2);
    let reset = repo.update_streak_on_completion(ADMIN).await.unwrap();
    assert_eq!(reset.stats.current_streak, 1);
    assert_eq!(reset.stats.longest_streak, 3);
    assert_eq!(reset.stats.tasks_completed, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn achievements_are_awarded_once() {
    let (tracker, _) = setup();
    let repo = tracker.gamification();

    repo.update_streak_on_completion(ADMIN).await.unwrap();
    let second = repo.update_streak_on_completion(ADMIN).await.unwrap();
    assert!(second.new_achievements.is_empty());

    let earned = repo.get_user_achievements(ADMIN).await.unwrap();
    assert_eq!(earned.len(), 1);
    assert_eq!(earned[0].achievement.code, "first_task");
    assert_eq!(earned[0].earned_at, "2025-03-03 18:00:00");
}

#[tokio::test(flavor = "multi_thread")]
async fn reaching_level_two_reports_level_up() {
    let (tracker, _) = setup();
    let repo = tracker.gamification();

    let mut outcome = repo.update_streak_on_completion(ADMIN).await.unwrap();
    while !outcome.leveled_up() {
        outcome = repo.update_streak_on_completion(ADMIN).await.unwrap();
    }
    assert_eq!(outcome.previous_level, 1);
    assert_eq!(outcome.stats.level, 2);
    assert!(outcome.stats.total_points >= LEVELS[1].min_points);
    assert_eq!(
        repo.get_stats(ADMIN).await.unwrap(),
        outcome.stats
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn leaderboard_ranks_by_points_then_name() {
    let (tracker, _) = setup();
    let users = tracker.users();
    let bea = users
        .create(&NewUser {
            username: "bea".to_string(),
            display_name: "Bea".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    users
        .create(&NewUser {
            username: "alf".to_string(),
            display_name: "Al".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    tracker
        .gamification()
        .update_streak_on_completion(bea.id)
        .await
        .unwrap();

    let board = tracker.gamification().leaderboard().await.unwrap();
    let names: Vec<&str> = board.iter().map(|e| e.display_name.as_str()).collect();
    assert_eq!(names, vec!["Bea", "Al", "Head of Household"]);
    assert_eq!(board.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(board[0].tasks_completed, 1);
    assert_eq!(board[1].total_points, 0);
    assert_eq!(board[1].title, LEVELS[0].title);
}

#[tokio::test(flavor = "multi_thread")]
async fn achievement_catalog_is_seeded() {
    let (tracker, _) = setup();
    let achievements = tracker.gamification().get_achievements().await.unwrap();
    assert!(achievements.iter().any(|a| a.code == "first_task"));
    assert!(achievements.windows(2).all(|w| w[0].id < w[1].id));
}
