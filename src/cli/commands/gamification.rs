use std::collections::HashMap;

use serde::Serialize;
use tabled::Tabled;

use crate::cli::error::CliResult;
use crate::cli::utils::{or_dash, render, render_detail, render_rows};
use crate::db::repositories::{LEVELS, level_title};
use crate::db::store::EntityStore;
use crate::db::{Achievement, Tracker, User};

/// Points still needed for the next level, if there is one.
fn points_to_next_level(total_points: i64) -> Option<i64> {
    LEVELS
        .iter()
        .find(|l| l.min_points > total_points)
        .map(|l| l.min_points - total_points)
}

pub async fn show_stats<S: EntityStore>(
    tracker: &Tracker<S>,
    user: &User,
    format: &str,
) -> CliResult<String> {
    let stats = tracker.gamification().get_stats(user.id).await?;
    render(format, &stats, || {
        render_detail([
            ("User", user.display_name.clone()),
            (
                "Level",
                format!("{} ({})", stats.level, level_title(stats.level)),
            ),
            ("Points", stats.total_points.to_string()),
            (
                "Next level in",
                or_dash(points_to_next_level(stats.total_points).map(|p| format!("{} points", p))),
            ),
            ("Chores done", stats.tasks_completed.to_string()),
            ("Current streak", format!("{} day(s)", stats.current_streak)),
            ("Longest streak", format!("{} day(s)", stats.longest_streak)),
            ("Last completion", or_dash(stats.last_completion_date.as_deref())),
        ])
    })
}

#[derive(Tabled)]
struct LeaderboardDisplay {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Points")]
    points: i64,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Streak")]
    streak: i64,
    #[tabled(rename = "Done")]
    done: i64,
}

pub async fn leaderboard<S: EntityStore>(tracker: &Tracker<S>, format: &str) -> CliResult<String> {
    let entries = tracker.gamification().leaderboard().await?;
    render(format, &entries, || {
        render_rows(
            entries
                .iter()
                .map(|e| LeaderboardDisplay {
                    rank: e.rank,
                    name: e.display_name.clone(),
                    points: e.total_points,
                    level: format!("{} {}", e.level, e.title),
                    streak: e.current_streak,
                    done: e.tasks_completed,
                })
                .collect(),
            "Nobody has done anything yet.",
        )
    })
}

/// An achievement and whether (and when) the user earned it.
#[derive(Debug, Serialize)]
struct AchievementStatus {
    #[serde(flatten)]
    achievement: Achievement,
    earned_at: Option<String>,
}

#[derive(Tabled)]
struct AchievementDisplay {
    #[tabled(rename = "")]
    icon: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Points")]
    points: i64,
    #[tabled(rename = "Earned")]
    earned: String,
}

/// The achievement catalog with the user's progress.
pub async fn achievements<S: EntityStore>(
    tracker: &Tracker<S>,
    user: &User,
    format: &str,
) -> CliResult<String> {
    let repo = tracker.gamification();
    let earned: HashMap<_, _> = repo
        .get_user_achievements(user.id)
        .await?
        .into_iter()
        .map(|e| (e.achievement.id, e.earned_at))
        .collect();
    let statuses: Vec<AchievementStatus> = repo
        .get_achievements()
        .await?
        .into_iter()
        .map(|achievement| AchievementStatus {
            earned_at: earned.get(&achievement.id).cloned(),
            achievement,
        })
        .collect();

    render(format, &statuses, || {
        let rows = statuses
            .iter()
            .map(|s| AchievementDisplay {
                icon: s.achievement.icon.clone(),
                name: s.achievement.name.clone(),
                description: s.achievement.description.clone(),
                points: s.achievement.points,
                earned: or_dash(s.earned_at.as_deref()),
            })
            .collect();
        format!(
            "{}: {} of {} earned\n{}",
            user.display_name,
            earned.len(),
            statuses.len(),
            render_rows(rows, "No achievements defined.")
        )
    })
}
