pub mod backup;
pub mod board;
pub mod comment;
pub mod excuse;
pub mod gamification;
pub mod issue;
pub mod migrate;
pub mod project;
pub mod sprint;
pub mod user;

use crate::cli::error::{CliError, CliResult};
use crate::db::store::EntityStore;
use crate::db::{Issue, Project, Tracker, User};

/// An issue by key (`HOME-1`) or numeric id.
pub async fn resolve_issue<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
) -> CliResult<Issue> {
    let found = match reference.parse() {
        Ok(id) => tracker.issues().get_by_id(id).await?,
        Err(_) => {
            tracker
                .issues()
                .get_by_key(&reference.to_uppercase())
                .await?
        }
    };
    found.ok_or_else(|| CliError::not_found("issue", reference))
}

pub async fn resolve_project<S: EntityStore>(
    tracker: &Tracker<S>,
    key: &str,
) -> CliResult<Project> {
    tracker
        .projects()
        .get_by_key(&key.to_uppercase())
        .await?
        .ok_or_else(|| CliError::not_found("project", key))
}

pub async fn resolve_user<S: EntityStore>(
    tracker: &Tracker<S>,
    username: &str,
) -> CliResult<User> {
    tracker
        .users()
        .get_by_username(username)
        .await?
        .ok_or_else(|| CliError::not_found("user", username))
}

#[cfg(test)]
#[path = "user_test.rs"]
mod user_test;

#[cfg(test)]
#[path = "project_test.rs"]
mod project_test;

#[cfg(test)]
#[path = "issue_test.rs"]
mod issue_test;

#[cfg(test)]
#[path = "comment_test.rs"]
mod comment_test;


#[cfg(test)]
#[path = "gamification_test.rs"]
mod gamification_test;
