use tabled::Tabled;

use crate::cli::error::CliResult;
use crate::cli::utils::{render, render_rows};
use crate::db::SqliteStore;
use crate::db::sqlite::{AppliedMigration, MigrationOutcome};

#[derive(Tabled)]
struct AppliedDisplay {
    #[tabled(rename = "Version")]
    version: i64,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&AppliedMigration> for AppliedDisplay {
    fn from(applied: &AppliedMigration) -> Self {
        Self {
            version: applied.version,
            name: applied.name.clone(),
        }
    }
}

/// Initialize the database and report what the migrator did.
pub async fn migrate(store: &SqliteStore, format: &str) -> CliResult<String> {
    let report = store.migration_report().await?;
    render(format, report, || match report.outcome {
        MigrationOutcome::SourceMissing => format!(
            "! No migrations found at {}; schema left at version {}",
            store.migrations(),
            report.current_version
        ),
        MigrationOutcome::UpToDate => {
            format!("✓ Schema is up to date (version {})", report.current_version)
        }
        MigrationOutcome::Applied => format!(
            "✓ Migrated schema from version {} to {}\n{}",
            report.previous_version,
            report.current_version,
            render_rows(report.applied.iter().map(AppliedDisplay::from).collect(), "")
        ),
    })
}
