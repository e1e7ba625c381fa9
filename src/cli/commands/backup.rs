use std::path::Path;

use crate::backup::{BackupSummary, export_all, import_all};
use crate::cli::error::CliResult;
use crate::db::store::EntityStore;
use crate::db::Collection;

fn describe(summary: &BackupSummary) -> String {
    Collection::ALL
        .iter()
        .filter(|c| summary.counts.contains_key(*c))
        .map(|c| format!("  {:<18} {}", c.table_name(), summary.get(*c)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn export<S: EntityStore>(store: &S, dir: &Path) -> CliResult<String> {
    let summary = export_all(store, dir).await?;
    Ok(format!(
        "✓ Exported {} records to {}\n{}",
        summary.total(),
        dir.display(),
        describe(&summary)
    ))
}

pub async fn import<S: EntityStore>(store: &S, dir: &Path) -> CliResult<String> {
    let summary = import_all(store, dir).await?;
    Ok(format!(
        "✓ Imported {} records from {}\n{}",
        summary.total(),
        dir.display(),
        describe(&summary)
    ))
}
