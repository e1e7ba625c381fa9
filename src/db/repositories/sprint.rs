//! Sprint repository.
//!
//! Starting a sprint does not check for another active sprint on the same
//! board; that is left to the caller.

use serde_json::json;
use tracing::{info, instrument};

use crate::db::store::{EntityStore, TypedStore};
use crate::db::utils::{Clock, format_date, format_timestamp, parse_date};
use crate::db::validation::{validate_new_sprint, validate_sprint_dates};
use crate::db::{Board, DbResult, Id, NewSprint, Sprint, SprintStatus};

pub struct SprintRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> SprintRepository<'a, S> {
    /// All sprints, oldest first.
    pub async fn get_all(&self) -> DbResult<Vec<Sprint>> {
        let mut sprints: Vec<Sprint> = self.store.fetch_all().await?;
        sprints.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(sprints)
    }

    pub async fn get_by_id(&self, id: Id) -> DbResult<Option<Sprint>> {
        self.store.fetch(id).await
    }

    pub async fn get_by_board(&self, board_id: Id) -> DbResult<Vec<Sprint>> {
        self.store
            .fetch_all_by_index("board_id", &json!(board_id))
            .await
    }

    /// The first active sprint of a board, if any.
    pub async fn get_active(&self, board_id: Id) -> DbResult<Option<Sprint>> {
        Ok(self
            .get_by_board(board_id)
            .await?
            .into_iter()
            .find(|s| s.status == SprintStatus::Active))
    }

    /// New sprints always start out as `future`.
    #[instrument(skip(self, sprint), fields(board_id = sprint.board_id))]
    pub async fn create(&self, sprint: &NewSprint) -> DbResult<Sprint> {
        validate_new_sprint(sprint)?;
        self.store.fetch_required::<Board>(sprint.board_id).await?;

        self.store
            .insert(&Sprint {
                id: 0,
                board_id: sprint.board_id,
                name: sprint.name.clone(),
                goal: sprint.goal.clone(),
                start_date: sprint.start_date.clone(),
                end_date: sprint.end_date.clone(),
                status: SprintStatus::Future,
                created_at: format_timestamp(self.clock.now()),
            })
            .await
    }

    /// Mark a sprint active. A missing start date becomes today, which must
    /// fall before a planned end date.
    #[instrument(skip(self))]
    pub async fn start_sprint(&self, id: Id) -> DbResult<Sprint> {
        let mut sprint: Sprint = self.store.fetch_required(id).await?;
        sprint.status = SprintStatus::Active;
        if sprint.start_date.is_none() {
            sprint.start_date = Some(format_date(self.clock.now().date_naive()));
        }
        validate_sprint_dates(&sprint)?;
        self.store.save(&sprint).await?;
        info!(name = %sprint.name, "Sprint started");
        Ok(sprint)
    }

    /// Mark a sprint closed. A missing end date becomes today, unless the
    /// sprint started today or later; then it stays unset.
    #[instrument(skip(self))]
    pub async fn close_sprint(&self, id: Id) -> DbResult<Sprint> {
        let mut sprint: Sprint = self.store.fetch_required(id).await?;
        sprint.status = SprintStatus::Closed;
        if sprint.end_date.is_none() {
            let today = self.clock.now().date_naive();
            let started = sprint.start_date.as_deref().and_then(parse_date);
            if started.is_none_or(|start| today > start) {
                sprint.end_date = Some(format_date(today));
            }
        }
        validate_sprint_dates(&sprint)?;
        self.store.save(&sprint).await?;
        info!(name = %sprint.name, "Sprint closed");
        Ok(sprint)
    }
}
