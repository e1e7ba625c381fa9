//! In-memory implementation of the entity store.
//!
//! Named collections of JSON records with declared indexes and
//! auto-incrementing keys, modelled on a browser object store. Nothing is
//! persisted; every instance starts empty (plus seed data).
//!
//! # Thread Safety
//!
//! State lives behind a `std::sync::Mutex` that is only held inside
//! synchronous sections, never across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::db::schema::{Collection, IndexDef};
use crate::db::seed::{self, SeedTarget};
use crate::db::store::{EntityStore, Record, display_value, record_id, resolve_index};
use crate::db::utils::current_timestamp;
use crate::db::{DbError, DbResult, Id};


#[derive(Debug)]
struct Table {
    next_id: Id,
    rows: BTreeMap<Id, Record>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: HashMap<Collection, Table>,
    sequences: HashMap<String, i64>,
}

fn field<'r>(record: &'r Record, name: &str) -> &'r Value {
    record.get(name).unwrap_or(&Value::Null)
}

impl MemoryState {
    /// Declare every collection from the schema.
    fn declare() -> Self {
        let tables = Collection::ALL
            .into_iter()
            .map(|c| (c, Table::default()))
            .collect();
        Self {
            tables,
            sequences: HashMap::new(),
        }
    }

    fn table(&self, collection: Collection) -> DbResult<&Table> {
        self.tables
            .get(&collection)
            .ok_or_else(|| DbError::database(format!("collection '{}' is not declared", collection)))
    }

    fn table_mut(&mut self, collection: Collection) -> DbResult<&mut Table> {
        self.tables
            .get_mut(&collection)
            .ok_or_else(|| DbError::database(format!("collection '{}' is not declared", collection)))
    }

    fn matching<'s>(
        &'s self,
        collection: Collection,
        index: &'s IndexDef,
        value: &'s Value,
    ) -> DbResult<impl Iterator<Item = &'s Record> + 's> {
        Ok(self
            .table(collection)?
            .rows
            .values()
            .filter(move |record| field(record, index.field) == value))
    }

    /// Unique indexes ignore nulls, like SQL `UNIQUE`.
    fn check_unique(&self, collection: Collection, record: &Record, own_id: Option<Id>) -> DbResult<()> {
        let table = self.table(collection)?;
        for index in collection.indexes().iter().filter(|idx| idx.unique) {
            let value = field(record, index.field);
            if value.is_null() {
                continue;
            }
            let clash = table
                .rows
                .iter()
                .any(|(id, other)| Some(*id) != own_id && field(other, index.field) == value);
            if clash {
                return Err(DbError::UniqueViolation {
                    entity_type: collection.entity_name().to_string(),
                    field: index.field.to_string(),
                    value: display_value(value).unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    fn insert_record(&mut self, collection: Collection, mut record: Record) -> DbResult<Id> {
        record.remove("id");
        self.check_unique(collection, &record, None)?;
        let table = self.table_mut(collection)?;
        let id = table.next_id;
        table.next_id += 1;
        record.insert("id".to_string(), Value::from(id));
        table.rows.insert(id, record);
        Ok(id)
    }

    fn replace_record(&mut self, collection: Collection, record: Record) -> DbResult<()> {
        let id = record_id(&record).ok_or_else(|| DbError::InvalidData {
            message: format!("{} record has no id", collection.entity_name()),
            help: "Updates replace a record by its id".to_string(),
        })?;
        if !self.table(collection)?.rows.contains_key(&id) {
            return Err(DbError::not_found(collection.entity_name(), id));
        }
        self.check_unique(collection, &record, Some(id))?;
        self.table_mut(collection)?.rows.insert(id, record);
        Ok(())
    }

    fn restore_record(&mut self, collection: Collection, record: Record) -> DbResult<()> {
        let id = record_id(&record).ok_or_else(|| DbError::InvalidData {
            message: format!("{} record has no id", collection.entity_name()),
            help: "Restored records keep their original id".to_string(),
        })?;
        if self.table(collection)?.rows.contains_key(&id) {
            return Err(DbError::UniqueViolation {
                entity_type: collection.entity_name().to_string(),
                field: "id".to_string(),
                value: id.to_string(),
            });
        }
        self.check_unique(collection, &record, None)?;
        let table = self.table_mut(collection)?;
        table.next_id = table.next_id.max(id + 1);
        table.rows.insert(id, record);
        Ok(())
    }
}

impl SeedTarget for MemoryState {
    async fn insert(&mut self, collection: Collection, record: Record) -> DbResult<Id> {
        self.insert_record(collection, record)
    }
}

/// Volatile entity store.
pub struct MemoryStore {
    state: OnceCell<Mutex<MemoryState>>,
    seed: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store that seeds reference data on first use.
    pub fn new() -> Self {
        Self {
            state: OnceCell::new(),
            seed: true,
        }
    }

    /// Skip seed data; the store starts with empty collections.
    pub fn without_seed_data(mut self) -> Self {
        self.seed = false;
        self
    }

    /// Lazily declare collections and seed, exactly once.
    async fn ready(&self) -> DbResult<MutexGuard<'_, MemoryState>> {
        let state = self
            .state
            .get_or_try_init(|| async {
                let mut state = MemoryState::declare();
                if self.seed {
                    seed::apply(&mut state, &current_timestamp()).await?;
                }
                debug!(seeded = self.seed, "Memory store initialized");
                Ok::<_, DbError>(Mutex::new(state))
            })
            .await?;

        state
            .lock()
            .map_err(|e| DbError::database(format!("Failed to acquire store lock: {}", e)))
    }
}

impl EntityStore for MemoryStore {
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>> {
        let state = self.ready().await?;
        Ok(state.table(collection)?.rows.values().cloned().collect())
    }

    async fn get_by_id(&self, collection: Collection, id: Id) -> DbResult<Option<Record>> {
        let state = self.ready().await?;
        Ok(state.table(collection)?.rows.get(&id).cloned())
    }

    async fn get_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> DbResult<Option<Record>> {
        let index = resolve_index(collection, index)?;
        let state = self.ready().await?;
        let found = state.matching(collection, index, value)?.next().cloned();
        Ok(found)
    }

    async fn get_all_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> DbResult<Vec<Record>> {
        let index = resolve_index(collection, index)?;
        let state = self.ready().await?;
        let found = state.matching(collection, index, value)?.cloned().collect();
        Ok(found)
    }

    async fn add(&self, collection: Collection, record: Record) -> DbResult<Id> {
        let mut state = self.ready().await?;
        state.insert_record(collection, record)
    }

    async fn update(&self, collection: Collection, record: Record) -> DbResult<()> {
        let mut state = self.ready().await?;
        state.replace_record(collection, record)
    }

    async fn delete(&self, collection: Collection, id: Id) -> DbResult<()> {
        let mut state = self.ready().await?;
        state.table_mut(collection)?.rows.remove(&id);
        Ok(())
    }

    async fn count(
        &self,
        collection: Collection,
        filter: Option<(&str, &Value)>,
    ) -> DbResult<usize> {
        let index = filter
            .map(|(name, value)| resolve_index(collection, name).map(|idx| (idx, value)))
            .transpose()?;
        let state = self.ready().await?;
        match index {
            Some((index, value)) => Ok(state.matching(collection, index, value)?.count()),
            None => Ok(state.table(collection)?.rows.len()),
        }
    }

    async fn next_sequence(&self, name: &str, floor: i64) -> DbResult<i64> {
        let mut state = self.ready().await?;
        let counter = state.sequences.entry(name.to_string()).or_insert(0);
        *counter = (*counter + 1).max(floor);
        Ok(*counter)
    }

    async fn restore(&self, collection: Collection, record: Record) -> DbResult<()> {
        let mut state = self.ready().await?;
        state.restore_record(collection, record)
    }
}
