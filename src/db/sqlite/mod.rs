//! SQLite implementation of the entity store.
//!
//! Tables come from versioned migrations; the store maps records onto them
//! using the column layout it reads at initialization.

mod migrator;
mod store;


pub use migrator::{
    AppliedMigration, MigrationOutcome, MigrationReport, MigrationSource, MigrationUnit, Migrator,
};
pub use store::SqliteStore;
