//! Excuse generator.

use rand::seq::IndexedRandom;
use serde_json::json;

use crate::db::store::{EntityStore, TypedStore};
use crate::db::validation::validate_new_excuse;
use crate::db::{DbResult, Excuse, NewExcuse};

pub struct ExcuseRepository<'a, S: EntityStore> {
    pub(crate) store: &'a S,
}

impl<'a, S: EntityStore> ExcuseRepository<'a, S> {
    pub async fn get_all(&self) -> DbResult<Vec<Excuse>> {
        let mut excuses: Vec<Excuse> = self.store.fetch_all().await?;
        excuses.sort_by(|a, b| a.category.cmp(&b.category).then(a.id.cmp(&b.id)));
        Ok(excuses)
    }

    pub async fn get_by_category(&self, category: &str) -> DbResult<Vec<Excuse>> {
        self.store
            .fetch_all_by_index("category", &json!(category))
            .await
    }

    /// A random excuse, optionally from one category.
    pub async fn random(&self, category: Option<&str>) -> DbResult<Option<Excuse>> {
        let pool = match category {
            Some(category) => self.get_by_category(category).await?,
            None => self.store.fetch_all().await?,
        };
        Ok(pool.choose(&mut rand::rng()).cloned())
    }

    pub async fn create(&self, excuse: &NewExcuse) -> DbResult<Excuse> {
        validate_new_excuse(excuse)?;
        self.store
            .insert(&Excuse {
                id: 0,
                category: excuse.category.clone(),
                text: excuse.text.clone(),
                believability: excuse.believability,
            })
            .await
    }
}
