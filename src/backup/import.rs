//! Load a JSONL backup into a store.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::{BackupError, BackupSummary, collection_file, read_jsonl};
use crate::db::schema::Collection;
use crate::db::store::{EntityStore, Record, record_id};
use crate::db::DbError;

/// Import every `<table>.jsonl` found in `input_dir`.
///
/// A record whose id already exists replaces the stored one; any other is
/// inserted with its id. Files that are absent are skipped.
#[instrument(skip(store))]
pub async fn import_all<S: EntityStore>(
    store: &S,
    input_dir: &Path,
) -> Result<BackupSummary, BackupError> {
    if !input_dir.is_dir() {
        return Err(BackupError::NotFound(input_dir.to_path_buf()));
    }

    let mut summary = BackupSummary::default();
    for collection in Collection::ALL {
        let path = collection_file(input_dir, collection);
        if !path.exists() {
            warn!(table = collection.table_name(), "No backup file, skipping");
            continue;
        }

        let records: Vec<Record> = read_jsonl(&path)?;
        let count = records.len();
        for record in records {
            upsert(store, collection, record).await?;
        }
        debug!(table = collection.table_name(), count, "Imported");
        summary.counts.insert(collection, count);
    }

    info!(total = summary.total(), "Import complete");
    Ok(summary)
}

async fn upsert<S: EntityStore>(
    store: &S,
    collection: Collection,
    record: Record,
) -> Result<(), BackupError> {
    let Some(id) = record_id(&record) else {
        return Err(DbError::InvalidData {
            message: format!("{} record without an id", collection.entity_name()),
            help: "Every backup line must carry its numeric id.".to_string(),
        }
        .into());
    };

    if store.get_by_id(collection, id).await?.is_some() {
        store.update(collection, record).await?;
    } else {
        store.restore(collection, record).await?;
    }
    Ok(())
}
