use tabled::Tabled;

use crate::cli::error::CliResult;
use crate::cli::utils::{or_dash, render, render_rows};
use crate::db::store::EntityStore;
use crate::db::{Id, NewSprint, Sprint, SprintStatus, Tracker};

#[derive(Tabled)]
struct SprintDisplay {
    #[tabled(rename = "ID")]
    id: Id,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Goal")]
    goal: String,
}

impl From<&Sprint> for SprintDisplay {
    fn from(sprint: &Sprint) -> Self {
        Self {
            id: sprint.id,
            name: sprint.name.clone(),
            status: sprint.status.to_string(),
            start: or_dash(sprint.start_date.as_deref()),
            end: or_dash(sprint.end_date.as_deref()),
            goal: or_dash(sprint.goal.as_deref()),
        }
    }
}

pub async fn list_sprints<S: EntityStore>(
    tracker: &Tracker<S>,
    board_id: Option<Id>,
    format: &str,
) -> CliResult<String> {
    let sprints = match board_id {
        Some(id) => tracker.sprints().get_by_board(id).await?,
        None => tracker.sprints().get_all().await?,
    };
    render(format, &sprints, || {
        render_rows(sprints.iter().map(SprintDisplay::from).collect(), "No sprints found.")
    })
}

pub async fn create_sprint<S: EntityStore>(
    tracker: &Tracker<S>,
    sprint: NewSprint,
) -> CliResult<String> {
    let sprint = tracker.sprints().create(&sprint).await?;
    Ok(format!("✓ Created sprint: {} ({})", sprint.name, sprint.id))
}

pub async fn start_sprint<S: EntityStore>(tracker: &Tracker<S>, id: Id) -> CliResult<String> {
    let sprint = tracker.sprints().start_sprint(id).await?;
    let mut message = format!(
        "✓ Sprint {} is active from {}",
        sprint.name,
        or_dash(sprint.start_date.as_deref())
    );
    let others = tracker
        .sprints()
        .get_by_board(sprint.board_id)
        .await?
        .into_iter()
        .filter(|s| s.id != sprint.id && s.status == SprintStatus::Active)
        .count();
    if others > 0 {
        message.push_str(&format!(
            "\n! {} other sprint(s) on this board are still active",
            others
        ));
    }
    Ok(message)
}

pub async fn close_sprint<S: EntityStore>(tracker: &Tracker<S>, id: Id) -> CliResult<String> {
    let sprint = tracker.sprints().close_sprint(id).await?;
    let open = tracker
        .issues()
        .get_by_sprint(sprint.id)
        .await?
        .iter()
        .filter(|i| i.resolved_at.is_none())
        .count();
    let closed_on = sprint
        .end_date
        .as_deref()
        .map(|end| format!(" on {}", end))
        .unwrap_or_default();
    Ok(format!(
        "✓ Sprint {} closed{} with {} unfinished issue(s)",
        sprint.name, closed_on, open
    ))
}
