//! Write every collection of a store to JSONL files.

use std::path::Path;

use tracing::{debug, info, instrument};

use super::{BackupError, BackupSummary, collection_file, write_jsonl};
use crate::db::schema::Collection;
use crate::db::store::{EntityStore, record_id};

/// Export all collections into `output_dir`, creating it when needed.
///
/// Records are written in id order. Empty collections still get an empty
/// file so an import can tell them from a missing backup.
#[instrument(skip(store))]
pub async fn export_all<S: EntityStore>(
    store: &S,
    output_dir: &Path,
) -> Result<BackupSummary, BackupError> {
    std::fs::create_dir_all(output_dir).map_err(|source| BackupError::Directory {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut summary = BackupSummary::default();
    for collection in Collection::ALL {
        let mut records = store.get_all(collection).await?;
        records.sort_by_key(record_id);
        write_jsonl(&collection_file(output_dir, collection), &records)?;
        debug!(table = collection.table_name(), count = records.len(), "Exported");
        summary.counts.insert(collection, records.len());
    }

    info!(total = summary.total(), "Export complete");
    Ok(summary)
}
