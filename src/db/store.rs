//! Storage-agnostic entity store contract.
//!
//! Records are JSON objects keyed by field name with a numeric `id`.
//! Repositories talk to this trait only; `SqliteStore` and `MemoryStore`
//! are the two conforming implementations.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::db::models::{
    Achievement, Board, Comment, Excuse, Id, Issue, IssueHistory, IssueType, Project, Sprint,
    User, UserAchievement, UserStats,
};
use crate::db::schema::{Collection, IndexDef};
use crate::db::{DbError, DbResult};

/// A stored record: field name to JSON value.
pub type Record = serde_json::Map<String, Value>;

/// Generic persistence over named collections.
#[allow(async_fn_in_trait)]
pub trait EntityStore: Send + Sync {
    /// All records of a collection, in storage order.
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>>;

    /// A record by id.
    async fn get_by_id(&self, collection: Collection, id: Id) -> DbResult<Option<Record>>;

    /// First record (lowest id) whose indexed field equals `value`.
    async fn get_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> DbResult<Option<Record>>;

    /// All records whose indexed field equals `value`.
    async fn get_all_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> DbResult<Vec<Record>>;

    /// Insert a record and return its store-generated id.
    async fn add(&self, collection: Collection, record: Record) -> DbResult<Id>;

    /// Replace the record with the same id.
    async fn update(&self, collection: Collection, record: Record) -> DbResult<()>;

    /// Remove a record. Removing an absent id is not an error.
    async fn delete(&self, collection: Collection, id: Id) -> DbResult<()>;

    /// Count all records, or those matching `(index, value)`.
    async fn count(&self, collection: Collection, filter: Option<(&str, &Value)>)
    -> DbResult<usize>;

    /// Atomically advance the named counter and return `max(previous + 1, floor)`.
    async fn next_sequence(&self, name: &str, floor: i64) -> DbResult<i64>;

    /// Insert a record keeping its `id` (backup import).
    async fn restore(&self, collection: Collection, record: Record) -> DbResult<()>;
}

/// A model persisted in a fixed collection.
pub trait Entity: Serialize + DeserializeOwned {
    const COLLECTION: Collection;
}

macro_rules! entity {
    ($($ty:ty => $collection:expr),+ $(,)?) => {
        $(impl Entity for $ty {
            const COLLECTION: Collection = $collection;
        })+
    };
}

entity! {
    User => Collection::Users,
    Project => Collection::Projects,
    IssueType => Collection::IssueTypes,
    Issue => Collection::Issues,
    Board => Collection::Boards,
    Sprint => Collection::Sprints,
    Comment => Collection::Comments,
    IssueHistory => Collection::IssueHistory,
    UserStats => Collection::UserStats,
    Achievement => Collection::Achievements,
    UserAchievement => Collection::UserAchievements,
    Excuse => Collection::Excuses,
}

/// Serialize a model into a record.
pub fn to_record<T: Serialize>(value: &T) -> DbResult<Record> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(DbError::InvalidData {
            message: format!("expected an object, got {}", other),
            help: "Only structs can be stored as records".to_string(),
        }),
        Err(e) => Err(DbError::InvalidData {
            message: e.to_string(),
            help: "The value could not be serialized".to_string(),
        }),
    }
}

/// Deserialize a record into a model of the given collection.
pub fn from_record<T: DeserializeOwned>(collection: Collection, record: Record) -> DbResult<T> {
    serde_json::from_value(Value::Object(record)).map_err(|e| DbError::InvalidData {
        message: format!("malformed {} record: {}", collection.entity_name(), e),
        help: "The stored data does not match the current model".to_string(),
    })
}

/// Resolve a declared index, failing for names the schema does not know.
pub(crate) fn resolve_index(collection: Collection, name: &str) -> DbResult<&'static IndexDef> {
    collection.index(name).ok_or_else(|| DbError::InvalidData {
        message: format!("unknown index '{}' on {}", name, collection),
        help: "Use one of the indexes declared in db::schema".to_string(),
    })
}

/// Read the `id` field of a record.
pub fn record_id(record: &Record) -> Option<Id> {
    record.get("id").and_then(Value::as_i64)
}

/// Render a JSON value the way it appears in messages and history entries.
pub fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Typed convenience layer over any [`EntityStore`].
#[allow(async_fn_in_trait)]
pub trait TypedStore: EntityStore {
    async fn fetch<T: Entity>(&self, id: Id) -> DbResult<Option<T>> {
        self.get_by_id(T::COLLECTION, id)
            .await?
            .map(|record| from_record(T::COLLECTION, record))
            .transpose()
    }

    /// Like [`TypedStore::fetch`] but absent records are `NotFound`.
    async fn fetch_required<T: Entity>(&self, id: Id) -> DbResult<T> {
        self.fetch(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::COLLECTION.entity_name(), id))
    }

    async fn fetch_all<T: Entity>(&self) -> DbResult<Vec<T>> {
        self.get_all(T::COLLECTION)
            .await?
            .into_iter()
            .map(|record| from_record(T::COLLECTION, record))
            .collect()
    }

    async fn fetch_by_index<T: Entity>(&self, index: &str, value: &Value) -> DbResult<Option<T>> {
        self.get_by_index(T::COLLECTION, index, value)
            .await?
            .map(|record| from_record(T::COLLECTION, record))
            .transpose()
    }

    async fn fetch_all_by_index<T: Entity>(&self, index: &str, value: &Value) -> DbResult<Vec<T>> {
        self.get_all_by_index(T::COLLECTION, index, value)
            .await?
            .into_iter()
            .map(|record| from_record(T::COLLECTION, record))
            .collect()
    }

    /// Insert a model (its `id` is ignored) and read back the stored version.
    async fn insert<T: Entity>(&self, value: &T) -> DbResult<T> {
        let mut record = to_record(value)?;
        record.remove("id");
        let id = self.add(T::COLLECTION, record).await?;
        self.fetch_required(id).await
    }

    /// Replace a stored model.
    async fn save<T: Entity>(&self, value: &T) -> DbResult<()> {
        self.update(T::COLLECTION, to_record(value)?).await
    }
}

impl<S: EntityStore + ?Sized> TypedStore for S {}
