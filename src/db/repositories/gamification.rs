//! Points, levels, streaks and achievements.
//!
//! Every completed issue is worth [`POINTS_PER_COMPLETION`]. Levels follow a
//! fixed breakpoint table and achievements pay their bonus exactly once per
//! user.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::db::store::{EntityStore, TypedStore};
use crate::db::utils::{Clock, format_date, format_timestamp, parse_date};
use crate::db::{
    Achievement, AchievementRequirement, DbResult, Id, User, UserAchievement, UserStats,
};

pub const POINTS_PER_COMPLETION: i64 = 10;

/// One step of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub level: i64,
    pub min_points: i64,
    pub title: &'static str,
}

const fn step(level: i64, min_points: i64, title: &'static str) -> Level {
    Level {
        level,
        min_points,
        title,
    }
}

/// Inclusive lower bounds, ascending.
pub const LEVELS: [Level; 10] = [
    step(1, 0, "Couch Potato"),
    step(2, 100, "Reluctant Helper"),
    step(3, 250, "Dish Rinser"),
    step(4, 500, "Laundry Folder"),
    step(5, 1000, "Vacuum Virtuoso"),
    step(6, 2000, "Tidy Titan"),
    step(7, 3500, "Chore Champion"),
    step(8, 5000, "Domestic Deity"),
    step(9, 7500, "Household Legend"),
    step(10, 10000, "Chief Chore Officer"),
];

pub fn level_for_points(points: i64) -> i64 {
    LEVELS
        .iter()
        .rev()
        .find(|l| points >= l.min_points)
        .map_or(1, |l| l.level)
}

pub fn level_title(level: i64) -> &'static str {
    LEVELS
        .iter()
        .find(|l| l.level == level)
        .map_or(LEVELS[0].title, |l| l.title)
}

/// What one completion changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionOutcome {
    pub stats: UserStats,
    pub previous_level: i64,
    pub new_achievements: Vec<Achievement>,
}

impl CompletionOutcome {
    pub fn leveled_up(&self) -> bool {
        self.stats.level > self.previous_level
    }
}

/// An achievement together with when the user earned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarnedAchievement {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub earned_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Id,
    pub display_name: String,
    pub total_points: i64,
    pub level: i64,
    pub title: &'static str,
    pub current_streak: i64,
    pub tasks_completed: i64,
}

fn satisfies(achievement: &Achievement, stats: &UserStats) -> bool {
    let value = match achievement.requirement {
        AchievementRequirement::TasksCompleted => stats.tasks_completed,
        AchievementRequirement::Streak => stats.current_streak,
        AchievementRequirement::Level => stats.level,
    };
    value >= achievement.threshold
}

pub struct GamificationRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> GamificationRepository<'a, S> {
    /// Stats of a user; zeroed level-1 stats when none are stored yet.
    pub async fn get_stats(&self, user_id: Id) -> DbResult<UserStats> {
        let stored: Option<UserStats> = self
            .store
            .fetch_by_index("user_id", &json!(user_id))
            .await?;
        Ok(stored.unwrap_or_else(|| {
            UserStats::empty(user_id, format_timestamp(self.clock.now()))
        }))
    }

    pub async fn get_achievements(&self) -> DbResult<Vec<Achievement>> {
        let mut achievements: Vec<Achievement> = self.store.fetch_all().await?;
        achievements.sort_by_key(|a| a.id);
        Ok(achievements)
    }

    /// Achievements a user has earned, oldest first.
    pub async fn get_user_achievements(&self, user_id: Id) -> DbResult<Vec<EarnedAchievement>> {
        let mut earned: Vec<UserAchievement> = self
            .store
            .fetch_all_by_index("user_id", &json!(user_id))
            .await?;
        earned.sort_by(|a, b| a.earned_at.cmp(&b.earned_at).then(a.id.cmp(&b.id)));

        let mut result = Vec::with_capacity(earned.len());
        for entry in earned {
            if let Some(achievement) = self.store.fetch::<Achievement>(entry.achievement_id).await? {
                result.push(EarnedAchievement {
                    achievement,
                    earned_at: entry.earned_at,
                });
            }
        }
        Ok(result)
    }

    /// Every user ranked by points, then by display name.
    pub async fn leaderboard(&self) -> DbResult<Vec<LeaderboardEntry>> {
        let users: Vec<User> = self.store.fetch_all().await?;
        let stats: HashMap<Id, UserStats> = self
            .store
            .fetch_all::<UserStats>()
            .await?
            .into_iter()
            .map(|s| (s.user_id, s))
            .collect();

        let mut entries: Vec<LeaderboardEntry> = users
            .into_iter()
            .map(|user| {
                let (points, level, streak, completed) = stats
                    .get(&user.id)
                    .map(|s| (s.total_points, s.level, s.current_streak, s.tasks_completed))
                    .unwrap_or((0, 1, 0, 0));
                LeaderboardEntry {
                    rank: 0,
                    user_id: user.id,
                    display_name: user.display_name,
                    total_points: points,
                    level,
                    title: level_title(level),
                    current_streak: streak,
                    tasks_completed: completed,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
        Ok(entries)
    }

    /// Credit one completed issue to `user_id`.
    ///
    /// Same calendar day keeps the streak, the next day extends it and any
    /// longer gap restarts it at 1.
    #[instrument(skip(self))]
    pub async fn update_streak_on_completion(&self, user_id: Id) -> DbResult<CompletionOutcome> {
        let now = self.clock.now();
        let today = now.date_naive();
        let mut stats = self.get_stats(user_id).await?;
        let previous_level = stats.level;

        let days_since = stats
            .last_completion_date
            .as_deref()
            .and_then(parse_date)
            .map(|last| (today - last).num_days());
        stats.current_streak = match days_since {
            Some(days) if days <= 0 => stats.current_streak,
            Some(1) => stats.current_streak + 1,
            _ => 1,
        };
        stats.longest_streak = stats.longest_streak.max(stats.current_streak);
        stats.tasks_completed += 1;
        stats.total_points += POINTS_PER_COMPLETION;
        stats.level = level_for_points(stats.total_points);
        stats.last_completion_date = Some(format_date(today));
        stats.updated_at = format_timestamp(now);

        let new_achievements = self.award_achievements(&mut stats).await?;

        let stats = if stats.id == 0 {
            self.store.insert(&stats).await?
        } else {
            self.store.save(&stats).await?;
            stats
        };

        if stats.level > previous_level {
            info!(user_id, level = stats.level, "Level up");
        }
        Ok(CompletionOutcome {
            stats,
            previous_level,
            new_achievements,
        })
    }

    /// Award every satisfied, not yet earned achievement.
    ///
    /// Bonus points can lift the level, which can satisfy a level
    /// achievement, so this repeats until nothing new is earned.
    async fn award_achievements(&self, stats: &mut UserStats) -> DbResult<Vec<Achievement>> {
        let achievements = self.get_achievements().await?;
        let mut earned: HashSet<Id> = self
            .store
            .fetch_all_by_index::<UserAchievement>("user_id", &json!(stats.user_id))
            .await?
            .into_iter()
            .map(|ua| ua.achievement_id)
            .collect();

        let mut awarded = Vec::new();
        loop {
            let due: Vec<&Achievement> = achievements
                .iter()
                .filter(|a| !earned.contains(&a.id) && satisfies(a, stats))
                .collect();
            if due.is_empty() {
                break;
            }
            for achievement in due {
                self.store
                    .insert(&UserAchievement {
                        id: 0,
                        user_id: stats.user_id,
                        achievement_id: achievement.id,
                        earned_at: stats.updated_at.clone(),
                    })
                    .await?;
                earned.insert(achievement.id);
                stats.total_points += achievement.points;
                info!(user_id = stats.user_id, code = %achievement.code, "Achievement earned");
                awarded.push(achievement.clone());
            }
            stats.level = level_for_points(stats.total_points);
        }
        Ok(awarded)
    }
}
