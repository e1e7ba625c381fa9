//! Project repository.

use serde_json::json;
use tracing::{info, instrument};

use crate::db::store::{EntityStore, TypedStore};
use crate::db::utils::{Clock, format_timestamp};
use crate::db::validation::{validate_new_project, validate_project_update};
use crate::db::{DbError, DbResult, Id, NewProject, Project, ProjectUpdate, User};

pub struct ProjectRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
    pub(crate) clock: &'a (dyn Clock + Send + Sync),
}

impl<'a, S: EntityStore> ProjectRepository<'a, S> {
    /// All projects ordered by name.
    pub async fn get_all(&self) -> DbResult<Vec<Project>> {
        let mut projects: Vec<Project> = self.store.fetch_all().await?;
        projects.sort_by_key(|p| p.name.to_lowercase());
        Ok(projects)
    }

    pub async fn get_by_id(&self, id: Id) -> DbResult<Option<Project>> {
        self.store.fetch(id).await
    }

    pub async fn get_by_key(&self, key: &str) -> DbResult<Option<Project>> {
        self.store.fetch_by_index("key", &json!(key)).await
    }

    #[instrument(skip(self, project), fields(key = %project.key))]
    pub async fn create(&self, project: &NewProject) -> DbResult<Project> {
        validate_new_project(project)?;

        if self.get_by_key(&project.key).await?.is_some() {
            return Err(DbError::UniqueViolation {
                entity_type: "Project".to_string(),
                field: "key".to_string(),
                value: project.key.clone(),
            });
        }
        self.store.fetch_required::<User>(project.created_by).await?;

        let now = format_timestamp(self.clock.now());
        let created = self
            .store
            .insert(&Project {
                id: 0,
                name: project.name.clone(),
                key: project.key.clone(),
                description: project.description.clone(),
                created_by: project.created_by,
                created_at: now.clone(),
                updated_at: now,
            })
            .await?;
        info!(id = created.id, "Created project");
        Ok(created)
    }

    /// Rename or re-describe a project. The key never changes.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Id, update: &ProjectUpdate) -> DbResult<Project> {
        validate_project_update(update)?;
        let mut project: Project = self.store.fetch_required(id).await?;

        if let Some(name) = &update.name {
            project.name = name.clone();
        }
        if let Some(description) = &update.description {
            project.description = description.clone();
        }
        project.updated_at = format_timestamp(self.clock.now());

        self.store.save(&project).await?;
        Ok(project)
    }
}
