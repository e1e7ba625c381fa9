//! Issue repository: key generation, status transitions and history.

use chrono::NaiveDate;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use super::history::HistoryRepository;
use crate::db::seed::DEFAULT_ISSUE_TYPE;
use crate::db::store::{Entity, EntityStore, TypedStore, display_value, to_record};
use crate::db::utils::{Clock, format_timestamp};
use crate::db::validation::{validate_issue_update, validate_new_issue, validate_status};
use crate::db::{
    ChangeType, DbResult, Id, Issue, IssueType, IssueUpdate, NewHistoryEntry, NewIssue, Project,
    STATUS_DONE, STATUS_TODO, Sprint, User,
};

/// Fields whose changes are written to the issue history.
const TRACKED_FIELDS: &[&str] = &[
    "summary",
    "description",
    "status",
    "priority",
    "issue_type_id",
    "assignee_id",
    "sprint_id",
    "due_date",
    "story_points",
    "procrastination_level",
    "spouse_approval_required",
    "netflix_episodes",
];

/// Number after the last `-` of an issue key.
fn key_number(issue_key: &str) -> Option<i64> {
    issue_key.rsplit_once('-')?.1.parse().ok()
}

fn newest_first(issues: &mut [Issue]) {
    issues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

/// Keep `resolved_at` in step with entering or leaving `done`.
fn apply_status(issue: &mut Issue, status: &str, now: &str) {
    if status == STATUS_DONE && issue.status != STATUS_DONE {
        issue.resolved_at = Some(now.to_string());
    } else if status != STATUS_DONE {
        issue.resolved_at = None;
    }
    issue.status = status.to_string();
}

pub struct IssueRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> IssueRepository<'a, S> {
    fn history(&self) -> HistoryRepository<'a, S> {
        HistoryRepository {
            store: self.store,
            clock: self.clock,
        }
    }

    /// All issues, newest first.
    pub async fn get_all(&self) -> DbResult<Vec<Issue>> {
        let mut issues: Vec<Issue> = self.store.fetch_all().await?;
        newest_first(&mut issues);
        Ok(issues)
    }

    pub async fn get_by_id(&self, id: Id) -> DbResult<Option<Issue>> {
        self.store.fetch(id).await
    }

    pub async fn get_by_key(&self, issue_key: &str) -> DbResult<Option<Issue>> {
        self.store
            .fetch_by_index("issue_key", &json!(issue_key))
            .await
    }

    async fn get_by(&self, index: &str, value: Value) -> DbResult<Vec<Issue>> {
        let mut issues: Vec<Issue> = self.store.fetch_all_by_index(index, &value).await?;
        newest_first(&mut issues);
        Ok(issues)
    }

    pub async fn get_by_project(&self, project_id: Id) -> DbResult<Vec<Issue>> {
        self.get_by("project_id", json!(project_id)).await
    }

    pub async fn get_by_assignee(&self, user_id: Id) -> DbResult<Vec<Issue>> {
        self.get_by("assignee_id", json!(user_id)).await
    }

    pub async fn get_by_sprint(&self, sprint_id: Id) -> DbResult<Vec<Issue>> {
        self.get_by("sprint_id", json!(sprint_id)).await
    }

    /// Open issues past their due date, most overdue first.
    pub async fn get_overdue(&self, today: NaiveDate) -> DbResult<Vec<Issue>> {
        let mut overdue: Vec<(i64, Issue)> = self
            .store
            .fetch_all::<Issue>()
            .await?
            .into_iter()
            .filter_map(|issue| issue.days_overdue(today).map(|days| (days, issue)))
            .collect();
        overdue.sort_by(|(da, a), (db, b)| db.cmp(da).then(a.id.cmp(&b.id)));
        Ok(overdue.into_iter().map(|(_, issue)| issue).collect())
    }

    /// Referenced rows must exist before an issue points at them.
    async fn check_references(
        &self,
        issue_type_id: Option<Id>,
        assignee_id: Option<Id>,
        sprint_id: Option<Id>,
    ) -> DbResult<()> {
        if let Some(id) = issue_type_id {
            self.store.fetch_required::<IssueType>(id).await?;
        }
        if let Some(id) = assignee_id {
            self.store.fetch_required::<User>(id).await?;
        }
        if let Some(id) = sprint_id {
            self.store.fetch_required::<Sprint>(id).await?;
        }
        Ok(())
    }

    /// Next `{KEY}-{n}` for a project.
    ///
    /// The counter never goes below the highest key already stored, so keys
    /// of deleted issues are not handed out again.
    async fn next_issue_key(&self, project: &Project) -> DbResult<String> {
        let highest = self
            .store
            .fetch_all_by_index::<Issue>("project_id", &json!(project.id))
            .await?
            .iter()
            .filter_map(|issue| key_number(&issue.issue_key))
            .max()
            .unwrap_or(0);
        let n = self
            .store
            .next_sequence(&format!("issue_key:{}", project.id), highest + 1)
            .await?;
        Ok(format!("{}-{}", project.key, n))
    }

    #[instrument(skip(self, issue), fields(project_id = issue.project_id))]
    pub async fn create(&self, issue: &NewIssue) -> DbResult<Issue> {
        validate_new_issue(issue)?;

        let project: Project = self.store.fetch_required(issue.project_id).await?;
        self.store.fetch_required::<User>(issue.reporter_id).await?;
        self.check_references(issue.issue_type_id, issue.assignee_id, issue.sprint_id)
            .await?;

        let issue_type_id = match issue.issue_type_id {
            Some(id) => Some(id),
            None => self
                .store
                .fetch_by_index::<IssueType>("name", &json!(DEFAULT_ISSUE_TYPE))
                .await?
                .map(|t| t.id),
        };

        let issue_key = self.next_issue_key(&project).await?;
        let now = format_timestamp(self.clock.now());
        let status = issue.status.clone().unwrap_or_else(|| STATUS_TODO.to_string());
        let resolved_at = (status == STATUS_DONE).then(|| now.clone());

        let created = self
            .store
            .insert(&Issue {
                id: 0,
                issue_key,
                project_id: project.id,
                issue_type_id,
                summary: issue.summary.clone(),
                description: issue.description.clone(),
                status,
                priority: issue.priority.unwrap_or_default(),
                assignee_id: issue.assignee_id,
                reporter_id: issue.reporter_id,
                sprint_id: issue.sprint_id,
                created_at: now.clone(),
                updated_at: now,
                due_date: issue.due_date.clone(),
                resolved_at,
                story_points: issue.story_points,
                procrastination_level: issue.procrastination_level.unwrap_or_default(),
                spouse_approval_required: issue.spouse_approval_required,
                netflix_episodes: issue.netflix_episodes,
            })
            .await?;

        self.history()
            .record(NewHistoryEntry {
                issue_id: created.id,
                user_id: issue.reporter_id,
                field_name: "issue".to_string(),
                old_value: None,
                new_value: Some(created.issue_key.clone()),
                change_type: ChangeType::Created,
            })
            .await?;

        info!(id = created.id, key = %created.issue_key, "Created issue");
        Ok(created)
    }

    /// Move an issue to `status`. Unchanged status is a successful no-op.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: Id, status: &str, actor: Id) -> DbResult<Issue> {
        validate_status(status)?;
        let mut issue: Issue = self.store.fetch_required(id).await?;
        if issue.status == status {
            debug!(key = %issue.issue_key, "Status unchanged");
            return Ok(issue);
        }

        let old_status = issue.status.clone();
        let now = format_timestamp(self.clock.now());
        apply_status(&mut issue, status, &now);
        issue.updated_at = now;
        self.store.save(&issue).await?;

        self.history()
            .record(NewHistoryEntry {
                issue_id: issue.id,
                user_id: actor,
                field_name: "status".to_string(),
                old_value: Some(old_status),
                new_value: Some(issue.status.clone()),
                change_type: ChangeType::Updated,
            })
            .await?;
        Ok(issue)
    }

    /// Merge a partial update and log one history entry per changed field.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Id, update: &IssueUpdate, actor: Id) -> DbResult<Issue> {
        validate_issue_update(update)?;
        let before: Issue = self.store.fetch_required(id).await?;
        self.check_references(
            update.issue_type_id.flatten(),
            update.assignee_id.flatten(),
            update.sprint_id.flatten(),
        )
        .await?;

        let now = format_timestamp(self.clock.now());
        let mut after = before.clone();
        if let Some(summary) = &update.summary {
            after.summary = summary.clone();
        }
        if let Some(description) = &update.description {
            after.description = description.clone();
        }
        if let Some(status) = &update.status {
            apply_status(&mut after, status, &now);
        }
        if let Some(priority) = update.priority {
            after.priority = priority;
        }
        if let Some(issue_type_id) = update.issue_type_id {
            after.issue_type_id = issue_type_id;
        }
        if let Some(assignee_id) = update.assignee_id {
            after.assignee_id = assignee_id;
        }
        if let Some(sprint_id) = update.sprint_id {
            after.sprint_id = sprint_id;
        }
        if let Some(due_date) = &update.due_date {
            after.due_date = due_date.clone();
        }
        if let Some(story_points) = update.story_points {
            after.story_points = story_points;
        }
        if let Some(level) = update.procrastination_level {
            after.procrastination_level = level;
        }
        if let Some(required) = update.spouse_approval_required {
            after.spouse_approval_required = required;
        }
        if let Some(episodes) = update.netflix_episodes {
            after.netflix_episodes = episodes;
        }

        let old = to_record(&before)?;
        let new = to_record(&after)?;
        let changes: Vec<NewHistoryEntry> = TRACKED_FIELDS
            .iter()
            .filter(|field| old.get(**field) != new.get(**field))
            .map(|field| NewHistoryEntry {
                issue_id: id,
                user_id: actor,
                field_name: (*field).to_string(),
                old_value: old.get(*field).and_then(display_value),
                new_value: new.get(*field).and_then(display_value),
                change_type: ChangeType::Updated,
            })
            .collect();

        if changes.is_empty() {
            return Ok(before);
        }

        after.updated_at = now;
        self.store.save(&after).await?;

        let history = self.history();
        for change in changes {
            history.record(change).await?;
        }
        Ok(after)
    }

    /// Remove an issue, leaving a `deleted` entry in its history.
    ///
    /// Comments and earlier history entries stay in place.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Id, actor: Id) -> DbResult<()> {
        let issue: Issue = self.store.fetch_required(id).await?;

        self.history()
            .record(NewHistoryEntry {
                issue_id: id,
                user_id: actor,
                field_name: "issue".to_string(),
                old_value: Some(issue.issue_key.clone()),
                new_value: None,
                change_type: ChangeType::Deleted,
            })
            .await?;

        self.store.delete(Issue::COLLECTION, id).await?;
        info!(key = %issue.issue_key, "Deleted issue");
        Ok(())
    }
}
