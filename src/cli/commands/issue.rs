use chrono::NaiveDate;
use clap::Args;
use tabled::Tabled;

use super::{resolve_issue, resolve_project, resolve_user};
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{or_dash, render, render_detail, render_rows, truncate_with_ellipsis};
use crate::db::repositories::{POINTS_PER_COMPLETION, level_title};
use crate::db::store::EntityStore;
use crate::db::{
    Id, Issue, IssueHistory, IssueUpdate, NewIssue, Priority, ProcrastinationLevel, STATUS_DONE,
    Tracker, User,
};

/// Optional issue fields shared by `issue create` and `issue update`.
///
/// On update an empty string clears a text or reference field.
#[derive(Args, Debug, Default, Clone)]
pub struct IssueFields {
    /// Longer description
    #[arg(long)]
    pub description: Option<String>,
    /// Issue type name (default: Chore)
    #[arg(long = "type")]
    pub issue_type: Option<String>,
    /// lowest, low, medium, high or critical
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Username of the assignee
    #[arg(long)]
    pub assignee: Option<String>,
    /// Sprint id (0 removes the issue from its sprint)
    #[arg(long)]
    pub sprint: Option<Id>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Story points (0-100)
    #[arg(long)]
    pub points: Option<i64>,
    /// low, medium, high or extreme
    #[arg(long)]
    pub procrastination: Option<ProcrastinationLevel>,
    /// Whether a spouse has to sign off
    #[arg(long)]
    pub spouse_approval: Option<bool>,
    /// Episodes watched instead of doing it
    #[arg(long)]
    pub episodes: Option<i64>,
}

/// Which issues `issue list` shows.
#[derive(Debug, Default)]
pub struct IssueFilter<'a> {
    pub project: Option<&'a str>,
    pub assignee: Option<&'a str>,
    pub sprint: Option<Id>,
}

#[derive(Tabled)]
struct IssueDisplay {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Summary")]
    summary: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Due")]
    due: String,
}

impl From<&Issue> for IssueDisplay {
    fn from(issue: &Issue) -> Self {
        Self {
            key: issue.issue_key.clone(),
            summary: truncate_with_ellipsis(&issue.summary, 50),
            status: issue.status.clone(),
            priority: issue.priority.to_string(),
            due: or_dash(issue.due_date.as_deref()),
        }
    }
}

#[derive(Tabled)]
struct HistoryDisplay {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "From")]
    old: String,
    #[tabled(rename = "To")]
    new: String,
}

impl From<&IssueHistory> for HistoryDisplay {
    fn from(entry: &IssueHistory) -> Self {
        Self {
            when: entry.created_at.clone(),
            change: entry.change_type.to_string(),
            field: entry.field_name.clone(),
            old: or_dash(entry.old_value.as_deref().map(|v| truncate_with_ellipsis(v, 30))),
            new: or_dash(entry.new_value.as_deref().map(|v| truncate_with_ellipsis(v, 30))),
        }
    }
}

async fn issue_type_id<S: EntityStore>(tracker: &Tracker<S>, name: &str) -> CliResult<Id> {
    tracker
        .issue_types()
        .get_by_name(name)
        .await?
        .map(|t| t.id)
        .ok_or_else(|| CliError::not_found("issue type", name))
}

async fn display_name<S: EntityStore>(tracker: &Tracker<S>, id: Option<Id>) -> CliResult<String> {
    let user = match id {
        Some(id) => tracker.users().get_by_id(id).await?,
        None => None,
    };
    Ok(or_dash(user.map(|u| u.display_name)))
}

pub async fn list_issues<S: EntityStore>(
    tracker: &Tracker<S>,
    filter: IssueFilter<'_>,
    format: &str,
) -> CliResult<String> {
    let mut issues = match filter.sprint {
        Some(sprint) => tracker.issues().get_by_sprint(sprint).await?,
        None => match filter.project {
            Some(key) => {
                let project = resolve_project(tracker, key).await?;
                tracker.issues().get_by_project(project.id).await?
            }
            None => tracker.issues().get_all().await?,
        },
    };
    if let Some(key) = filter.project.filter(|_| filter.sprint.is_some()) {
        let project = resolve_project(tracker, key).await?;
        issues.retain(|i| i.project_id == project.id);
    }
    if let Some(username) = filter.assignee {
        let user = resolve_user(tracker, username).await?;
        issues.retain(|i| i.assignee_id == Some(user.id));
    }

    render(format, &issues, || {
        render_rows(issues.iter().map(IssueDisplay::from).collect(), "No issues found.")
    })
}

pub async fn show_issue<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
    format: &str,
) -> CliResult<String> {
    let issue = resolve_issue(tracker, reference).await?;
    let assignee = display_name(tracker, issue.assignee_id).await?;
    let reporter = display_name(tracker, Some(issue.reporter_id)).await?;
    let issue_type = match issue.issue_type_id {
        Some(id) => tracker.issue_types().get_by_id(id).await?,
        None => None,
    };

    render(format, &issue, || {
        render_detail([
            ("Key", issue.issue_key.clone()),
            ("Summary", issue.summary.clone()),
            ("Type", or_dash(issue_type.map(|t| t.name))),
            ("Status", issue.status.clone()),
            ("Priority", issue.priority.to_string()),
            ("Assignee", assignee),
            ("Reporter", reporter),
            ("Sprint", or_dash(issue.sprint_id)),
            ("Due", or_dash(issue.due_date.as_deref())),
            ("Story points", or_dash(issue.story_points)),
            ("Procrastination", issue.procrastination_level.to_string()),
            (
                "Spouse approval",
                (if issue.spouse_approval_required {
                    "required"
                } else {
                    "not required"
                })
                .to_string(),
            ),
            ("Netflix episodes", or_dash(issue.netflix_episodes)),
            ("Description", or_dash(issue.description.as_deref())),
            ("Created", issue.created_at.clone()),
            ("Resolved", or_dash(issue.resolved_at.as_deref())),
        ])
    })
}

pub async fn create_issue<S: EntityStore>(
    tracker: &Tracker<S>,
    project_key: &str,
    summary: &str,
    status: Option<String>,
    fields: IssueFields,
    actor: &User,
) -> CliResult<String> {
    let project = resolve_project(tracker, project_key).await?;
    let issue_type_id = match fields.issue_type.as_deref() {
        Some(name) => Some(issue_type_id(tracker, name).await?),
        None => None,
    };
    let assignee_id = match fields.assignee.as_deref() {
        Some(username) => Some(resolve_user(tracker, username).await?.id),
        None => None,
    };

    let issue = tracker
        .issues()
        .create(&NewIssue {
            project_id: project.id,
            summary: summary.to_string(),
            reporter_id: actor.id,
            issue_type_id,
            description: fields.description,
            status,
            priority: fields.priority,
            assignee_id,
            sprint_id: fields.sprint,
            due_date: fields.due,
            story_points: fields.points,
            procrastination_level: fields.procrastination,
            spouse_approval_required: fields.spouse_approval.unwrap_or(false),
            netflix_episodes: fields.episodes,
        })
        .await?;
    Ok(format!("✓ Created issue: {} {}", issue.issue_key, issue.summary))
}

/// Empty input clears the field.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| (!v.is_empty()).then_some(v))
}

pub async fn update_issue<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
    summary: Option<String>,
    fields: IssueFields,
    actor: &User,
) -> CliResult<String> {
    let issue = resolve_issue(tracker, reference).await?;

    let issue_type_id = match clearable(fields.issue_type) {
        Some(Some(name)) => Some(Some(issue_type_id(tracker, &name).await?)),
        Some(None) => Some(None),
        None => None,
    };
    let assignee_id = match clearable(fields.assignee) {
        Some(Some(username)) => Some(Some(resolve_user(tracker, &username).await?.id)),
        Some(None) => Some(None),
        None => None,
    };

    let update = IssueUpdate {
        summary,
        description: clearable(fields.description),
        status: None,
        priority: fields.priority,
        issue_type_id,
        assignee_id,
        sprint_id: fields.sprint.map(|id| (id > 0).then_some(id)),
        due_date: clearable(fields.due),
        story_points: fields.points.map(Some),
        procrastination_level: fields.procrastination,
        spouse_approval_required: fields.spouse_approval,
        netflix_episodes: fields.episodes.map(Some),
    };
    let updated = tracker.issues().update(issue.id, &update, actor.id).await?;

    if updated == issue {
        Ok(format!("Nothing to change on {}", issue.issue_key))
    } else {
        Ok(format!("✓ Updated issue: {}", updated.issue_key))
    }
}

/// Move an issue to `status`. Finishing it credits the acting user.
pub async fn set_status<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
    status: &str,
    actor: &User,
) -> CliResult<String> {
    let issue = resolve_issue(tracker, reference).await?;
    if issue.status == status {
        return Ok(format!("{} is already {}", issue.issue_key, status));
    }

    let updated = tracker
        .issues()
        .update_status(issue.id, status, actor.id)
        .await?;
    let mut lines = vec![format!(
        "✓ {}: {} → {}",
        updated.issue_key, issue.status, updated.status
    )];

    if updated.status == STATUS_DONE {
        let outcome = tracker
            .gamification()
            .update_streak_on_completion(actor.id)
            .await?;
        let stats = &outcome.stats;
        lines.push(format!(
            "+{} points for {} (total {}, streak {})",
            POINTS_PER_COMPLETION,
            actor.display_name,
            stats.total_points,
            stats.current_streak
        ));
        for achievement in &outcome.new_achievements {
            lines.push(format!(
                "{} Achievement unlocked: {} (+{})",
                achievement.icon, achievement.name, achievement.points
            ));
        }
        if outcome.leveled_up() {
            lines.push(format!(
                "⬆ Level up! Level {}: {}",
                stats.level,
                level_title(stats.level)
            ));
        }
    }
    Ok(lines.join("\n"))
}

pub async fn delete_issue<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
    actor: &User,
) -> CliResult<String> {
    let issue = resolve_issue(tracker, reference).await?;
    tracker.issues().delete(issue.id, actor.id).await?;
    Ok(format!("✓ Deleted issue: {}", issue.issue_key))
}

pub async fn issue_history<S: EntityStore>(
    tracker: &Tracker<S>,
    reference: &str,
    format: &str,
) -> CliResult<String> {
    let issue = resolve_issue(tracker, reference).await?;
    let history = tracker.history().get_by_issue_id(issue.id).await?;
    render(format, &history, || {
        render_rows(
            history.iter().map(HistoryDisplay::from).collect(),
            "No history recorded.",
        )
    })
}

#[derive(Tabled)]
struct OverdueDisplay {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Summary")]
    summary: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Days overdue")]
    days: i64,
}

pub async fn overdue_issues<S: EntityStore>(
    tracker: &Tracker<S>,
    today: NaiveDate,
    format: &str,
) -> CliResult<String> {
    let issues = tracker.issues().get_overdue(today).await?;
    render(format, &issues, || {
        render_rows(
            issues
                .iter()
                .map(|i| OverdueDisplay {
                    key: i.issue_key.clone(),
                    summary: truncate_with_ellipsis(&i.summary, 50),
                    due: or_dash(i.due_date.as_deref()),
                    days: i.days_overdue(today).unwrap_or(0),
                })
                .collect(),
            "Nothing overdue. Suspicious.",
        )
    })
}
