//! Board repository.

use serde_json::json;
use tracing::instrument;

use crate::db::store::{EntityStore, TypedStore};
use crate::db::utils::{Clock, format_timestamp};
use crate::db::validation::validate_new_board;
use crate::db::{Board, DbResult, Id, NewBoard, Project};

pub struct BoardRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> BoardRepository<'a, S> {
    /// All boards ordered by name.
    pub async fn get_all(&self) -> DbResult<Vec<Board>> {
        let mut boards: Vec<Board> = self.store.fetch_all().await?;
        boards.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(boards)
    }

    pub async fn get_by_id(&self, id: Id) -> DbResult<Option<Board>> {
        self.store.fetch(id).await
    }

    pub async fn get_by_project(&self, project_id: Id) -> DbResult<Vec<Board>> {
        self.store
            .fetch_all_by_index("project_id", &json!(project_id))
            .await
    }

    #[instrument(skip(self, board), fields(project_id = board.project_id))]
    pub async fn create(&self, board: &NewBoard) -> DbResult<Board> {
        validate_new_board(board)?;
        self.store.fetch_required::<Project>(board.project_id).await?;

        self.store
            .insert(&Board {
                id: 0,
                project_id: board.project_id,
                name: board.name.clone(),
                board_type: board.board_type,
                created_at: format_timestamp(self.clock.now()),
            })
            .await
    }
}
