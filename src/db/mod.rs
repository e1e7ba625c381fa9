//! Data-access layer.
//!
//! Repositories hold the domain rules and talk to storage only through the
//! [`EntityStore`] trait, so the SQLite and in-memory backends are
//! interchangeable.
//!
//! # Architecture
//!
//! - `error`: Storage-agnostic error types
//! - `models`: Domain entities and input DTOs
//! - `schema`: Collections and their declared indexes
//! - `store`: The `EntityStore` contract and typed helpers
//! - `sqlite` / `memory`: The two store implementations
//! - `repositories`: Typed facades per entity, bundled by `Tracker`

mod error;
pub mod memory;
mod models;
pub mod repositories;
pub mod schema;
pub mod seed;
pub mod sqlite;
pub mod store;
pub mod utils;
pub mod validation;

#[cfg(test)]
mod validation_test;

pub use error::{DbError, DbResult, FieldError};
pub use memory::MemoryStore;
pub use models::*;
pub use repositories::Tracker;
pub use schema::Collection;
pub use sqlite::SqliteStore;
pub use store::{EntityStore, Record, TypedStore};
