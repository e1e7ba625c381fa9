//! Append-only issue history.

use serde_json::json;

use crate::db::store::{EntityStore, TypedStore};
use crate::db::utils::{Clock, format_timestamp};
use crate::db::{DbResult, Id, IssueHistory, NewHistoryEntry};

pub struct HistoryRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> HistoryRepository<'a, S> {
    /// Entries of one issue, oldest first.
    pub async fn get_by_issue_id(&self, issue_id: Id) -> DbResult<Vec<IssueHistory>> {
        let mut entries: Vec<IssueHistory> = self
            .store
            .fetch_all_by_index("issue_id", &json!(issue_id))
            .await?;
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    pub async fn record(&self, entry: NewHistoryEntry) -> DbResult<IssueHistory> {
        self.store
            .insert(&IssueHistory {
                id: 0,
                issue_id: entry.issue_id,
                user_id: entry.user_id,
                field_name: entry.field_name,
                old_value: entry.old_value,
                new_value: entry.new_value,
                change_type: entry.change_type,
                created_at: format_timestamp(self.clock.now()),
            })
            .await
    }
}
