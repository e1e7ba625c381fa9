//! Issue type repository (reference data).

use serde_json::json;

use crate::db::store::{EntityStore, TypedStore};
use crate::db::validation::validate_new_issue_type;
use crate::db::{DbError, DbResult, Id, IssueType, NewIssueType};

pub struct IssueTypeRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
}

impl<'a, S: EntityStore> IssueTypeRepository<'a, S> {
    pub async fn get_all(&self) -> DbResult<Vec<IssueType>> {
        let mut types: Vec<IssueType> = self.store.fetch_all().await?;
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    pub async fn get_by_id(&self, id: Id) -> DbResult<Option<IssueType>> {
        self.store.fetch(id).await
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<IssueType>> {
        self.store.fetch_by_index("name", &json!(name)).await
    }

    pub async fn create(&self, issue_type: &NewIssueType) -> DbResult<IssueType> {
        validate_new_issue_type(issue_type)?;
        if self.get_by_name(&issue_type.name).await?.is_some() {
            return Err(DbError::UniqueViolation {
                entity_type: "IssueType".to_string(),
                field: "name".to_string(),
                value: issue_type.name.clone(),
            });
        }
        self.store
            .insert(&IssueType {
                id: 0,
                name: issue_type.name.clone(),
                icon: issue_type.icon.clone(),
                color: issue_type.color.clone(),
                description: issue_type.description.clone(),
            })
            .await
    }
}
