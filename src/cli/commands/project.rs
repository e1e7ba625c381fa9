use tabled::Tabled;

use super::resolve_project;
use crate::cli::error::CliResult;
use crate::cli::utils::{or_dash, render, render_detail, render_rows, truncate_with_ellipsis};
use crate::db::store::EntityStore;
use crate::db::{NewProject, Project, Tracker, User};

#[derive(Tabled)]
struct ProjectDisplay {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Project> for ProjectDisplay {
    fn from(project: &Project) -> Self {
        Self {
            key: project.key.clone(),
            name: truncate_with_ellipsis(&project.name, 40),
            description: or_dash(
                project
                    .description
                    .as_deref()
                    .map(|d| truncate_with_ellipsis(d, 50)),
            ),
        }
    }
}

pub async fn list_projects<S: EntityStore>(
    tracker: &Tracker<S>,
    format: &str,
) -> CliResult<String> {
    let projects = tracker.projects().get_all().await?;
    render(format, &projects, || {
        render_rows(
            projects.iter().map(ProjectDisplay::from).collect(),
            "No projects found.",
        )
    })
}

pub async fn show_project<S: EntityStore>(
    tracker: &Tracker<S>,
    key: &str,
    format: &str,
) -> CliResult<String> {
    let project = resolve_project(tracker, key).await?;
    let issues = tracker.issues().get_by_project(project.id).await?;
    let owner = tracker.users().get_by_id(project.created_by).await?;

    render(format, &project, || {
        let open = issues.iter().filter(|i| i.resolved_at.is_none()).count();
        render_detail([
            ("Key", project.key.clone()),
            ("Name", project.name.clone()),
            ("Description", or_dash(project.description.as_deref())),
            ("Created by", or_dash(owner.map(|u| u.display_name))),
            ("Issues", format!("{} ({} open)", issues.len(), open)),
            ("Created", project.created_at.clone()),
        ])
    })
}

pub async fn create_project<S: EntityStore>(
    tracker: &Tracker<S>,
    key: &str,
    name: &str,
    description: Option<String>,
    actor: &User,
) -> CliResult<String> {
    let project = tracker
        .projects()
        .create(&NewProject {
            name: name.to_string(),
            key: key.to_string(),
            description,
            created_by: actor.id,
        })
        .await?;
    Ok(format!("✓ Created project: {} ({})", project.name, project.key))
}
