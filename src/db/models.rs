//! Domain models for the homeboard store.
//!
//! These models are storage-agnostic and represent the core entities
//! used throughout the application. Field names match the column names of
//! the SQLite schema and the keys of memory-store records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::serde_utils::double_option;

/// Store-generated integer identity.
pub type Id = i64;

// =============================================================================
// Enumerations
// =============================================================================

/// Household role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
    Guest,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Member => write!(f, "member"),
            Role::Guest => write!(f, "guest"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "guest" => Ok(Role::Guest),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Issue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Lowest => "lowest",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lowest" => Ok(Priority::Lowest),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// How long this chore is likely to be put off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcrastinationLevel {
    #[default]
    Low,
    Medium,
    High,
    Extreme,
}

impl std::fmt::Display for ProcrastinationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcrastinationLevel::Low => "low",
            ProcrastinationLevel::Medium => "medium",
            ProcrastinationLevel::High => "high",
            ProcrastinationLevel::Extreme => "extreme",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ProcrastinationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ProcrastinationLevel::Low),
            "medium" => Ok(ProcrastinationLevel::Medium),
            "high" => Ok(ProcrastinationLevel::High),
            "extreme" => Ok(ProcrastinationLevel::Extreme),
            _ => Err(format!("Invalid procrastination level: {}", s)),
        }
    }
}

/// Board flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardType {
    Scrum,
    #[default]
    Kanban,
}

impl std::fmt::Display for BoardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardType::Scrum => write!(f, "scrum"),
            BoardType::Kanban => write!(f, "kanban"),
        }
    }
}

impl std::str::FromStr for BoardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scrum" => Ok(BoardType::Scrum),
            "kanban" => Ok(BoardType::Kanban),
            _ => Err(format!("Invalid board type: {}", s)),
        }
    }
}

/// Lifecycle of a sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    #[default]
    Future,
    Active,
    Closed,
}

impl std::fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SprintStatus::Future => write!(f, "future"),
            SprintStatus::Active => write!(f, "active"),
            SprintStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Kind of change recorded in the issue history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Created => write!(f, "created"),
            ChangeType::Updated => write!(f, "updated"),
            ChangeType::Deleted => write!(f, "deleted"),
        }
    }
}

/// Which user statistic an achievement threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementRequirement {
    TasksCompleted,
    Streak,
    Level,
}

// =============================================================================
// Entities
// =============================================================================

/// A household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

/// A project groups issues under a short key such as `HOME`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    pub created_by: Id,
    pub created_at: String,
    pub updated_at: String,
}

/// Reference data: chore, bug, errand, ...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    pub id: Id,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// A unit of household work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: Id,
    pub issue_key: String,
    pub project_id: Id,
    pub issue_type_id: Option<Id>,
    pub summary: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Priority,
    pub assignee_id: Option<Id>,
    pub reporter_id: Id,
    pub sprint_id: Option<Id>,
    pub created_at: String,
    pub updated_at: String,
    pub due_date: Option<String>,
    pub resolved_at: Option<String>,
    pub story_points: Option<i64>,
    pub procrastination_level: ProcrastinationLevel,
    pub spouse_approval_required: bool,
    pub netflix_episodes: Option<i64>,
}

impl Issue {
    /// Whole days past the due date, or `None` when not overdue, undated or done.
    pub fn days_overdue(&self, today: NaiveDate) -> Option<i64> {
        if self.status == STATUS_DONE {
            return None;
        }
        let due = NaiveDate::parse_from_str(self.due_date.as_deref()?, DATE_FORMAT).ok()?;
        let days = (today - due).num_days();
        (days > 0).then_some(days)
    }
}

/// A board shows the issues of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: Id,
    pub project_id: Id,
    pub name: String,
    pub board_type: BoardType,
    pub created_at: String,
}

/// A time-boxed batch of chores on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: Id,
    pub board_id: Id,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: SprintStatus,
    pub created_at: String,
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub issue_id: Id,
    pub author_id: Id,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_edited: bool,
    pub is_passive_aggressive: bool,
}

/// A comment joined with its author's display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: String,
    pub author_avatar: Option<String>,
}

/// One entry of the append-only issue audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueHistory {
    pub id: Id,
    pub issue_id: Id,
    pub user_id: Id,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_type: ChangeType,
    pub created_at: String,
}

/// Gamification counters for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub id: Id,
    pub user_id: Id,
    pub total_points: i64,
    pub level: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub tasks_completed: i64,
    pub last_completion_date: Option<String>,
    pub updated_at: String,
}

impl UserStats {
    /// Zeroed stats for a user that has not completed anything yet.
    pub fn empty(user_id: Id, updated_at: String) -> Self {
        Self {
            id: 0,
            user_id,
            total_points: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            tasks_completed: 0,
            last_completion_date: None,
            updated_at,
        }
    }
}

/// An achievement definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: Id,
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub points: i64,
    pub requirement: AchievementRequirement,
    pub threshold: i64,
}

/// An achievement earned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
    pub id: Id,
    pub user_id: Id,
    pub achievement_id: Id,
    pub earned_at: String,
}

/// A canned reason for not doing a chore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excuse {
    pub id: Id,
    pub category: String,
    pub text: String,
    pub believability: i64,
}

// =============================================================================
// Input DTOs
// =============================================================================

pub const STATUS_TODO: &str = "todo";
pub const STATUS_DONE: &str = "done";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub avatar_url: Option<Option<String>>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub key: String,
    pub description: Option<String>,
    pub created_by: Id,
}

/// The key is deliberately absent: it is immutable once set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIssueType {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIssue {
    pub project_id: Id,
    pub summary: String,
    pub reporter_id: Id,
    pub issue_type_id: Option<Id>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Id>,
    pub sprint_id: Option<Id>,
    pub due_date: Option<String>,
    pub story_points: Option<i64>,
    pub procrastination_level: Option<ProcrastinationLevel>,
    #[serde(default)]
    pub spouse_approval_required: bool,
    pub netflix_episodes: Option<i64>,
}

/// Partial issue update. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueUpdate {
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub issue_type_id: Option<Option<Id>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Id>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sprint_id: Option<Option<Id>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub story_points: Option<Option<i64>>,
    pub procrastination_level: Option<ProcrastinationLevel>,
    pub spouse_approval_required: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub netflix_episodes: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBoard {
    pub project_id: Id,
    pub name: String,
    #[serde(default)]
    pub board_type: BoardType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSprint {
    pub board_id: Id,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    pub issue_id: Id,
    pub author_id: Id,
    pub content: String,
    #[serde(default)]
    pub is_passive_aggressive: bool,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub issue_id: Id,
    pub user_id: Id,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExcuse {
    pub category: String,
    pub text: String,
    pub believability: i64,
}
