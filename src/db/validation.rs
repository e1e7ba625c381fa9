//! Field-level validation for repository inputs.
//!
//! Every check collects all failing fields before returning, so callers can
//! show one message per field. Validation always runs before the store is
//! touched.

use crate::db::models::{
    IssueUpdate, NewBoard, NewComment, NewExcuse, NewIssue, NewIssueType, NewProject, NewSprint,
    NewUser, ProjectUpdate, Sprint, UserUpdate,
};
use crate::db::utils::parse_date;
use crate::db::{DbError, DbResult, FieldError};

/// Accumulates field errors.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Character-count bounds, inclusive.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min {
            if min == 1 {
                self.error(field, "must not be empty");
            } else {
                self.error(field, format!("must be at least {} characters", min));
            }
        } else if len > max {
            self.error(field, format!("must be at most {} characters", max));
        }
    }

    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            self.length(field, v, 0, max);
        }
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) {
        if value < min || value > max {
            self.error(field, format!("must be between {} and {}", min, max));
        }
    }

    pub fn date(&mut self, field: &str, value: Option<&str>) {
        if let Some(v) = value
            && parse_date(v).is_none()
        {
            self.error(field, "must be a date formatted YYYY-MM-DD");
        }
    }

    pub fn finish(self) -> DbResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DbError::Validation {
                errors: self.errors,
            })
        }
    }
}

fn check_username(v: &mut Validator, username: &str) {
    v.length("username", username, 3, 50);
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        v.error(
            "username",
            "may only contain letters, digits, underscores and hyphens",
        );
    }
}

fn check_email(v: &mut Validator, email: Option<&str>) {
    let Some(email) = email else {
        return;
    };
    v.max_length("email", Some(email), 255);
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        v.error("email", "must be a valid email address");
    }
}

pub fn check_project_key(v: &mut Validator, key: &str) {
    v.length("key", key, 2, 10);
    let starts_with_letter = key.chars().next().is_some_and(|c| c.is_ascii_uppercase());
    let uppercase_alnum = key
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !starts_with_letter || !uppercase_alnum {
        v.error(
            "key",
            "must start with a letter and contain only uppercase letters and digits",
        );
    }
}

/// Status is free-form but kept machine friendly.
pub fn check_status(v: &mut Validator, status: &str) {
    v.length("status", status, 1, 50);
    if !status
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        v.error(
            "status",
            "may only contain lowercase letters, digits and underscores",
        );
    }
}

fn check_story_points(v: &mut Validator, points: Option<i64>) {
    if let Some(points) = points {
        v.range("story_points", points, 0, 100);
    }
}

fn check_netflix_episodes(v: &mut Validator, episodes: Option<i64>) {
    if let Some(episodes) = episodes
        && episodes < 0
    {
        v.error("netflix_episodes", "must not be negative");
    }
}

pub fn validate_new_user(user: &NewUser) -> DbResult<()> {
    let mut v = Validator::new();
    check_username(&mut v, &user.username);
    v.length("display_name", &user.display_name, 1, 100);
    check_email(&mut v, user.email.as_deref());
    v.max_length("avatar_url", user.avatar_url.as_deref(), 2000);
    v.finish()
}

pub fn validate_user_update(update: &UserUpdate) -> DbResult<()> {
    let mut v = Validator::new();
    if let Some(name) = &update.display_name {
        v.length("display_name", name, 1, 100);
    }
    if let Some(email) = &update.email {
        check_email(&mut v, email.as_deref());
    }
    if let Some(avatar) = &update.avatar_url {
        v.max_length("avatar_url", avatar.as_deref(), 2000);
    }
    v.finish()
}

pub fn validate_new_project(project: &NewProject) -> DbResult<()> {
    let mut v = Validator::new();
    v.length("name", &project.name, 1, 100);
    check_project_key(&mut v, &project.key);
    v.max_length("description", project.description.as_deref(), 2000);
    v.finish()
}

pub fn validate_project_update(update: &ProjectUpdate) -> DbResult<()> {
    let mut v = Validator::new();
    if let Some(name) = &update.name {
        v.length("name", name, 1, 100);
    }
    if let Some(description) = &update.description {
        v.max_length("description", description.as_deref(), 2000);
    }
    v.finish()
}

pub fn validate_new_issue_type(issue_type: &NewIssueType) -> DbResult<()> {
    let mut v = Validator::new();
    v.length("name", &issue_type.name, 1, 50);
    v.max_length("description", issue_type.description.as_deref(), 500);
    v.finish()
}

pub fn validate_new_issue(issue: &NewIssue) -> DbResult<()> {
    let mut v = Validator::new();
    v.length("summary", &issue.summary, 1, 500);
    v.max_length("description", issue.description.as_deref(), 10_000);
    if let Some(status) = &issue.status {
        check_status(&mut v, status);
    }
    v.date("due_date", issue.due_date.as_deref());
    check_story_points(&mut v, issue.story_points);
    check_netflix_episodes(&mut v, issue.netflix_episodes);
    v.finish()
}

pub fn validate_issue_update(update: &IssueUpdate) -> DbResult<()> {
    let mut v = Validator::new();
    if let Some(summary) = &update.summary {
        v.length("summary", summary, 1, 500);
    }
    if let Some(description) = &update.description {
        v.max_length("description", description.as_deref(), 10_000);
    }
    if let Some(status) = &update.status {
        check_status(&mut v, status);
    }
    if let Some(due_date) = &update.due_date {
        v.date("due_date", due_date.as_deref());
    }
    if let Some(points) = update.story_points {
        check_story_points(&mut v, points);
    }
    if let Some(episodes) = update.netflix_episodes {
        check_netflix_episodes(&mut v, episodes);
    }
    v.finish()
}

pub fn validate_status(status: &str) -> DbResult<()> {
    let mut v = Validator::new();
    check_status(&mut v, status);
    v.finish()
}

pub fn validate_new_board(board: &NewBoard) -> DbResult<()> {
    let mut v = Validator::new();
    v.length("name", &board.name, 1, 100);
    v.finish()
}

pub fn validate_new_sprint(sprint: &NewSprint) -> DbResult<()> {
    let mut v = Validator::new();
    v.length("name", &sprint.name, 1, 100);
    v.max_length("goal", sprint.goal.as_deref(), 1000);
    check_sprint_dates(
        &mut v,
        sprint.start_date.as_deref(),
        sprint.end_date.as_deref(),
    );
    v.finish()
}

fn check_sprint_dates(v: &mut Validator, start_date: Option<&str>, end_date: Option<&str>) {
    v.date("start_date", start_date);
    v.date("end_date", end_date);
    let start = start_date.and_then(parse_date);
    let end = end_date.and_then(parse_date);
    if let (Some(start), Some(end)) = (start, end)
        && end <= start
    {
        v.error("end_date", "must be after start_date");
    }
}

/// Dates of a stored sprint, checked again after start or close fills them in.
pub fn validate_sprint_dates(sprint: &Sprint) -> DbResult<()> {
    let mut v = Validator::new();
    check_sprint_dates(
        &mut v,
        sprint.start_date.as_deref(),
        sprint.end_date.as_deref(),
    );
    v.finish()
}

pub fn validate_comment_content(content: &str) -> DbResult<()> {
    let mut v = Validator::new();
    v.length("content", content, 1, 5000);
    v.finish()
}

pub fn validate_new_comment(comment: &NewComment) -> DbResult<()> {
    validate_comment_content(&comment.content)
}

pub fn validate_new_excuse(excuse: &NewExcuse) -> DbResult<()> {
    let mut v = Validator::new();
    v.length("category", &excuse.category, 1, 50);
    v.length("text", &excuse.text, 1, 500);
    v.range("believability", excuse.believability, 1, 10);
    v.finish()
}
