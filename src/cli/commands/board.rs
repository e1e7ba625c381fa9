use tabled::Tabled;

use super::resolve_project;
use crate::cli::error::CliResult;
use crate::cli::utils::{render, render_rows};
use crate::db::store::EntityStore;
use crate::db::{Board, BoardType, Id, NewBoard, Tracker};

#[derive(Tabled)]
struct BoardDisplay {
    #[tabled(rename = "ID")]
    id: Id,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    board_type: String,
    #[tabled(rename = "Project")]
    project_id: Id,
}

impl From<&Board> for BoardDisplay {
    fn from(board: &Board) -> Self {
        Self {
            id: board.id,
            name: board.name.clone(),
            board_type: board.board_type.to_string(),
            project_id: board.project_id,
        }
    }
}

pub async fn list_boards<S: EntityStore>(
    tracker: &Tracker<S>,
    project_key: Option<&str>,
    format: &str,
) -> CliResult<String> {
    let boards = match project_key {
        Some(key) => {
            let project = resolve_project(tracker, key).await?;
            tracker.boards().get_by_project(project.id).await?
        }
        None => tracker.boards().get_all().await?,
    };
    render(format, &boards, || {
        render_rows(boards.iter().map(BoardDisplay::from).collect(), "No boards found.")
    })
}

pub async fn create_board<S: EntityStore>(
    tracker: &Tracker<S>,
    project_key: &str,
    name: &str,
    board_type: BoardType,
) -> CliResult<String> {
    let project = resolve_project(tracker, project_key).await?;
    let board = tracker
        .boards()
        .create(&NewBoard {
            project_id: project.id,
            name: name.to_string(),
            board_type,
        })
        .await?;
    Ok(format!(
        "✓ Created {} board: {} ({})",
        board.board_type, board.name, board.id
    ))
}
