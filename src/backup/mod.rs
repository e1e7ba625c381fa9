//! JSONL backup of a whole store.
//!
//! Every collection is written to `<table>.jsonl` in one directory, one
//! record per line with its id. Import reads the same layout back in
//! [`Collection::ALL`] order so parents land before the rows that point at
//! them.

mod export;
mod import;
mod jsonl;


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::db::DbError;
use crate::db::schema::Collection;

pub use export::export_all;
pub use import::import_all;
pub use jsonl::{JsonlError, read_jsonl, write_jsonl};

#[derive(Error, Diagnostic, Debug)]
pub enum BackupError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("Backup directory unusable: {path}: {source}")]
    #[diagnostic(code(homeboard::backup::directory))]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Backup directory not found: {0}")]
    #[diagnostic(
        code(homeboard::backup::not_found),
        help("Pass the directory a previous `hb export` wrote to.")
    )]
    NotFound(PathBuf),
}

/// Records written or read per collection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    pub counts: BTreeMap<Collection, usize>,
}

impl BackupSummary {
    pub fn get(&self, collection: Collection) -> usize {
        self.counts.get(&collection).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// File holding one collection inside a backup directory.
pub fn collection_file(dir: &Path, collection: Collection) -> PathBuf {
    dir.join(format!("{}.jsonl", collection.table_name()))
}
